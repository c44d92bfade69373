//! Declaration rewriting: wrapped field, wrapped getter, no setter.

use tracing::{debug, warn};

use crate::ast::{ClassDecl, ClassMember, FieldDecl, MethodDecl};

use super::index::MigrationRecord;
use super::matcher::MigrationCandidate;
use super::report::{Diagnostic, DiagnosticKind, MigrationReport};
use super::MigrationContext;

/// What happened to the field's original initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerFate {
    Absent,
    /// Null or empty literal, removed
    Dropped,
    /// Kept as written; likely no longer type-checks against the wrapper
    Carried,
}

/// Replacement members for one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationEdit {
    pub field: FieldDecl,
    pub getter: MethodDecl,
    pub removed_setter: String,
    pub initializer: InitializerFate,
    pub record: MigrationRecord,
}

pub struct DeclarationRewriter<'c> {
    ctx: &'c MigrationContext,
}

impl<'c> DeclarationRewriter<'c> {
    pub fn new(ctx: &'c MigrationContext) -> Self {
        Self { ctx }
    }

    /// Build the edit for one candidate. `None` if the class does not hold
    /// the candidate's field and getter.
    pub fn rewrite(
        &self,
        class: &ClassDecl,
        candidate: &MigrationCandidate,
        unit: &str,
    ) -> Option<DeclarationEdit> {
        let field = class.field(&candidate.field)?;
        let getter = class
            .methods()
            .find(|method| method.name == candidate.getter && method.params.is_empty())?;
        let wrapper_type = self.ctx.wrap(&candidate.original_type);

        let mut new_field = field.clone();
        new_field.ty = wrapper_type.clone();
        new_field.is_final = true;
        let initializer = match &field.initializer {
            None => InitializerFate::Absent,
            Some(init) if init.is_trivial_literal() => {
                new_field.initializer = None;
                InitializerFate::Dropped
            }
            Some(_) => InitializerFate::Carried,
        };

        let mut new_getter = getter.clone();
        new_getter.return_type = wrapper_type.clone();

        Some(DeclarationEdit {
            field: new_field,
            getter: new_getter,
            removed_setter: candidate.setter.clone(),
            initializer,
            record: MigrationRecord {
                class: candidate.class.clone(),
                property: candidate.property.clone(),
                original_type: candidate.original_type.clone(),
                wrapper_type,
                mutation_method: self.ctx.mutation_method().to_string(),
                getter: candidate.getter.clone(),
                setter: candidate.setter.clone(),
                unit: unit.to_string(),
            },
        })
    }

    /// Apply edits to the class's own members. Nested classes are left as
    /// they are.
    pub fn apply(&self, class: &ClassDecl, edits: &[DeclarationEdit]) -> ClassDecl {
        let members = class
            .members
            .iter()
            .filter(|member| !edits.iter().any(|edit| is_removed_setter(member, edit)))
            .map(|member| match member {
                ClassMember::Field(field) => edits
                    .iter()
                    .find(|edit| edit.field.name == field.name)
                    .map(|edit| ClassMember::Field(edit.field.clone()))
                    .unwrap_or_else(|| member.clone()),
                ClassMember::Method(method) if method.params.is_empty() => edits
                    .iter()
                    .find(|edit| edit.getter.name == method.name)
                    .map(|edit| ClassMember::Method(edit.getter.clone()))
                    .unwrap_or_else(|| member.clone()),
                other => other.clone(),
            })
            .collect();

        ClassDecl {
            name: class.name.clone(),
            superclass: class.superclass.clone(),
            members,
        }
    }

    /// Rewrite every candidate of one class, returning the new class and the
    /// records to index
    pub fn rewrite_class(
        &self,
        class: &ClassDecl,
        candidates: &[MigrationCandidate],
        unit: &str,
        report: &mut MigrationReport,
    ) -> (ClassDecl, Vec<MigrationRecord>) {
        let edits: Vec<DeclarationEdit> = candidates
            .iter()
            .filter_map(|candidate| self.rewrite(class, candidate, unit))
            .collect();

        for edit in &edits {
            debug!(
                class = %edit.record.class,
                property = %edit.record.property,
                wrapper = %edit.record.wrapper_type,
                "rewrote property declaration"
            );
            report.declarations_rewritten += 1;
            report.setters_removed += 1;
            match edit.initializer {
                InitializerFate::Absent => {}
                InitializerFate::Dropped => report.initializers_dropped += 1,
                InitializerFate::Carried => {
                    warn!(
                        class = %edit.record.class,
                        field = %edit.field.name,
                        "kept initializer on migrated field; review manually"
                    );
                    report.push(Diagnostic::new(
                        DiagnosticKind::CarriedInitializer,
                        unit,
                        Some(edit.record.class.clone()),
                        format!(
                            "field '{}' keeps its initializer but is now {}",
                            edit.field.name, edit.field.ty
                        ),
                    ));
                }
            }
        }

        let rewritten = if edits.is_empty() {
            class.clone()
        } else {
            self.apply(class, &edits)
        };
        let records = edits.into_iter().map(|edit| edit.record).collect();
        (rewritten, records)
    }
}

fn is_removed_setter(member: &ClassMember, edit: &DeclarationEdit) -> bool {
    match member {
        ClassMember::Method(method) => {
            method.name == edit.removed_setter
                && method.return_type.is_void()
                && matches!(method.params.as_slice(), [param] if param.ty == edit.record.original_type)
        }
        _ => false,
    }
}
