/*!
# Declaration Patterns

Small composable matchers over method declarations and qualified names,
used by the property matcher to describe getter and setter shapes.
*/

use regex::Regex;

use crate::ast::{MethodDecl, TypeRef};
use crate::error::Result;

/// Matches a qualified name either fully or by its simple name, so
/// `org.gradle.api.tasks.Input` accepts both the qualified and the bare
/// `Input` spelling an upstream parser may produce.
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
}

impl NamePattern {
    pub fn for_qualified(qualified: &str) -> Result<Self> {
        let pattern = match qualified.rsplit_once('.') {
            Some((package, simple)) => format!(
                r"^(?:{}\.)?{}$",
                regex::escape(package),
                regex::escape(simple)
            ),
            None => format!(r"^{}$", regex::escape(qualified)),
        };
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn matches_type(&self, ty: &TypeRef) -> bool {
        matches!(ty, TypeRef::Class { name, .. } if self.matches(name))
    }
}

/// Pattern over method declarations
pub trait MethodPattern {
    fn matches(&self, method: &MethodDecl) -> bool;
}

/// Pattern constructors
pub struct PatternMatcher;

impl PatternMatcher {
    pub fn predicate<F>(predicate: F) -> impl MethodPattern
    where
        F: Fn(&MethodDecl) -> bool,
    {
        PredicateMatcher { predicate }
    }

    pub fn named(name: &str) -> NameMatcher {
        NameMatcher {
            name: name.to_string(),
        }
    }

    pub fn arity(count: usize) -> impl MethodPattern {
        PredicateMatcher {
            predicate: move |method: &MethodDecl| method.params.len() == count,
        }
    }

    pub fn returning_void() -> impl MethodPattern {
        PredicateMatcher {
            predicate: |method: &MethodDecl| method.return_type.is_void(),
        }
    }

    /// Single parameter of exactly this type
    pub fn accepting(ty: &TypeRef) -> impl MethodPattern + '_ {
        PredicateMatcher {
            predicate: move |method: &MethodDecl| {
                matches!(method.params.as_slice(), [param] if &param.ty == ty)
            },
        }
    }

    pub fn annotated_with(annotation: &NamePattern) -> AnnotatedMatcher<'_> {
        AnnotatedMatcher { annotation }
    }

    pub fn all<P1: MethodPattern, P2: MethodPattern>(p1: P1, p2: P2) -> AndPattern<P1, P2> {
        AndPattern { p1, p2 }
    }

    pub fn not<P: MethodPattern>(pattern: P) -> NotPattern<P> {
        NotPattern { pattern }
    }
}

struct PredicateMatcher<F>
where
    F: Fn(&MethodDecl) -> bool,
{
    predicate: F,
}

impl<F> MethodPattern for PredicateMatcher<F>
where
    F: Fn(&MethodDecl) -> bool,
{
    fn matches(&self, method: &MethodDecl) -> bool {
        (self.predicate)(method)
    }
}

pub struct NameMatcher {
    name: String,
}

impl MethodPattern for NameMatcher {
    fn matches(&self, method: &MethodDecl) -> bool {
        method.name == self.name
    }
}

pub struct AnnotatedMatcher<'p> {
    annotation: &'p NamePattern,
}

impl MethodPattern for AnnotatedMatcher<'_> {
    fn matches(&self, method: &MethodDecl) -> bool {
        method
            .annotations
            .iter()
            .any(|annotation| self.annotation.matches(&annotation.name))
    }
}

pub struct AndPattern<P1: MethodPattern, P2: MethodPattern> {
    p1: P1,
    p2: P2,
}

impl<P1: MethodPattern, P2: MethodPattern> MethodPattern for AndPattern<P1, P2> {
    fn matches(&self, method: &MethodDecl) -> bool {
        self.p1.matches(method) && self.p2.matches(method)
    }
}

pub struct NotPattern<P: MethodPattern> {
    pattern: P,
}

impl<P: MethodPattern> MethodPattern for NotPattern<P> {
    fn matches(&self, method: &MethodDecl) -> bool {
        !self.pattern.matches(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;

    #[test]
    fn test_name_pattern_accepts_simple_and_qualified() {
        let pattern = NamePattern::for_qualified("org.gradle.api.tasks.Input").unwrap();
        assert!(pattern.matches("org.gradle.api.tasks.Input"));
        assert!(pattern.matches("Input"));
        assert!(!pattern.matches("InputFile"));
        assert!(!pattern.matches("org.gradle.api.tasks.InputFile"));
        assert!(!pattern.matches("org.gradleXapi.tasks.Input"));
        assert!(!pattern.matches("com.acme.Input"));
    }

    #[test]
    fn test_setter_shape() {
        let ty = TypeRef::string();
        let setter = MethodDecl::new("setProperty", TypeRef::Void)
            .with_param(Param::new("value", TypeRef::string()));
        let pattern = PatternMatcher::all(
            PatternMatcher::named("setProperty"),
            PatternMatcher::all(PatternMatcher::returning_void(), PatternMatcher::accepting(&ty)),
        );
        assert!(pattern.matches(&setter));

        let wrong_param = MethodDecl::new("setProperty", TypeRef::Void)
            .with_param(Param::new("value", TypeRef::primitive("int")));
        assert!(!pattern.matches(&wrong_param));
    }

    #[test]
    fn test_annotated_and_not() {
        let marker = NamePattern::for_qualified("org.gradle.api.tasks.Input").unwrap();
        let getter = MethodDecl::new("getProperty", TypeRef::string()).annotated("Input");
        let plain = MethodDecl::new("getProperty", TypeRef::string());

        assert!(PatternMatcher::annotated_with(&marker).matches(&getter));
        assert!(!PatternMatcher::annotated_with(&marker).matches(&plain));
        assert!(PatternMatcher::not(PatternMatcher::returning_void()).matches(&getter));
        assert!(PatternMatcher::all(PatternMatcher::arity(0), PatternMatcher::named("getProperty"))
            .matches(&getter));
    }
}
