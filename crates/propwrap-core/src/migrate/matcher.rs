//! Migration candidate detection for a single class.

use std::collections::HashSet;

use crate::ast::{ClassDecl, ClassId, MethodDecl, TypeRef};

use super::naming::{self, GetterPrefix};
use super::patterns::{MethodPattern, PatternMatcher};
use super::report::{Diagnostic, DiagnosticKind};
use super::MigrationContext;

/// A field/getter/setter triple that will be migrated. Only lives during
/// the matching phase.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationCandidate {
    pub class: ClassId,
    pub property: String,
    pub original_type: TypeRef,
    pub field: String,
    pub getter: String,
    pub setter: String,
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub candidates: Vec<MigrationCandidate>,
    /// Marker-annotated getters that could not be paired
    pub rejections: Vec<Diagnostic>,
}

/// Scans one class, never its nested classes or superclasses
pub struct PropertyMatcher<'c> {
    ctx: &'c MigrationContext,
}

impl<'c> PropertyMatcher<'c> {
    pub fn new(ctx: &'c MigrationContext) -> Self {
        Self { ctx }
    }

    pub fn match_class(&self, class: &ClassDecl, unit: &str) -> MatchOutcome {
        let getter_shape = PatternMatcher::all(
            PatternMatcher::annotated_with(self.ctx.marker()),
            PatternMatcher::all(
                PatternMatcher::predicate(|method| {
                    naming::property_from_getter(&method.name).is_some()
                }),
                PatternMatcher::all(
                    PatternMatcher::arity(0),
                    PatternMatcher::not(PatternMatcher::returning_void()),
                ),
            ),
        );

        let mut outcome = MatchOutcome::default();
        let mut seen = HashSet::new();

        for getter in class.methods().filter(|method| getter_shape.matches(method)) {
            let Some((prefix, property)) = naming::property_from_getter(&getter.name) else {
                continue;
            };
            if prefix == GetterPrefix::Is && !naming::is_boolean(&getter.return_type) {
                continue;
            }
            // Already migrated on an earlier run
            if self.ctx.is_wrapper(&getter.return_type) {
                continue;
            }

            match self.complete_triple(class, getter, property) {
                Ok(candidate) => {
                    if seen.insert(candidate.property.clone()) {
                        outcome.candidates.push(candidate);
                    } else {
                        outcome.rejections.push(Diagnostic::new(
                            DiagnosticKind::IndexConflict,
                            unit,
                            Some(class.name.clone()),
                            format!(
                                "{} maps to property '{}' which is already a candidate",
                                candidate.getter, candidate.property
                            ),
                        ));
                    }
                }
                Err(reason) => outcome.rejections.push(Diagnostic::new(
                    DiagnosticKind::MalformedCandidate,
                    unit,
                    Some(class.name.clone()),
                    reason,
                )),
            }
        }

        outcome
    }

    fn complete_triple(
        &self,
        class: &ClassDecl,
        getter: &MethodDecl,
        property: String,
    ) -> Result<MigrationCandidate, String> {
        let ty = &getter.return_type;

        let field = class
            .field(&property)
            .ok_or_else(|| format!("{} has no backing field '{}'", getter.name, property))?;
        if self.ctx.is_wrapper(&field.ty) || &field.ty != ty {
            return Err(format!(
                "field '{}' is {} but {} returns {}",
                field.name, field.ty, getter.name, ty
            ));
        }

        let setter = naming::setter_for_getter(&getter.name)
            .ok_or_else(|| format!("{} is not an accessor name", getter.name))?;
        let setter_shape = PatternMatcher::all(
            PatternMatcher::named(&setter),
            PatternMatcher::all(PatternMatcher::returning_void(), PatternMatcher::accepting(ty)),
        );
        if !class.methods().any(|method| setter_shape.matches(method)) {
            return Err(format!("{} has no matching setter void {}({})", getter.name, setter, ty));
        }

        Ok(MigrationCandidate {
            class: class.name.clone(),
            property,
            original_type: ty.clone(),
            field: field.name.clone(),
            getter: getter.name.clone(),
            setter,
        })
    }
}
