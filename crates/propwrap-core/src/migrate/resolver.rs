/*!
# Receiver Resolution

Decides which migrated property, if any, a setter invocation targets.

Explicit receivers are typed statically. Calls without a receiver walk the
enclosing closures from the innermost outwards; each closure ranks its owner
and its declared delegate according to its resolve strategy, and the first
candidate type that provably answers the call wins. When no closure claims
the call it falls through to the enclosing class.

Anything that cannot be proven resolves to `Ambiguous` and is left alone.
*/

use std::collections::HashMap;

use crate::ast::{ClassId, Closure, DelegateHint, Expr, Param, ResolveStrategy, TypeRef};

use super::class_table::ClassTable;
use super::index::{MigratedSymbolIndex, MigrationRecord};
use super::naming;

/// Closure metadata visible to name resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureScope {
    /// Class the closure is lexically declared in
    pub owner: ClassId,
    pub delegate: Option<DelegateHint>,
    /// No declared parameters, so `it` is bound implicitly
    pub implicit_it: bool,
}

impl ClosureScope {
    /// Candidate receivers in the order the runtime would consult them
    fn ranked_candidates(&self) -> Vec<Candidate<'_>> {
        let owner = Candidate::Owner(&self.owner);
        let Some(hint) = &self.delegate else {
            return vec![owner];
        };
        let delegate = Candidate::Delegate(&hint.ty);
        match hint.strategy {
            ResolveStrategy::OwnerFirst => vec![owner, delegate],
            ResolveStrategy::DelegateFirst => vec![delegate, owner],
            ResolveStrategy::OwnerOnly => vec![owner],
            ResolveStrategy::DelegateOnly => vec![delegate],
        }
    }

    /// The owner is never consulted, so an unanswered call stops here
    fn delegate_only(&self) -> bool {
        matches!(
            &self.delegate,
            Some(DelegateHint {
                strategy: ResolveStrategy::DelegateOnly,
                ..
            })
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Candidate<'s> {
    Owner(&'s ClassId),
    Delegate(&'s TypeRef),
}

#[derive(Debug, Default)]
struct Frame {
    bindings: HashMap<String, TypeRef>,
    closure: Option<ClosureScope>,
}

/// Lexical scope at the point of an invocation: the enclosing class, local
/// bindings, and the chain of enclosing closures
#[derive(Debug)]
pub struct ScopeChain {
    class: ClassId,
    frames: Vec<Frame>,
}

impl ScopeChain {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            frames: vec![Frame::default()],
        }
    }

    pub fn enclosing_class(&self) -> &ClassId {
        &self.class
    }

    pub fn push_method(&mut self, params: &[Param]) {
        self.frames.push(Frame {
            bindings: bind_params(params),
            closure: None,
        });
    }

    pub fn push_block(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn push_closure(&mut self, closure: &Closure) {
        self.frames.push(Frame {
            bindings: bind_params(&closure.params),
            closure: Some(ClosureScope {
                owner: self.class.clone(),
                delegate: closure.delegate.clone(),
                implicit_it: closure.params.is_empty(),
            }),
        });
    }

    pub fn pop(&mut self) {
        // The root frame stays
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, ty: TypeRef) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.into(), ty);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    /// Enclosing closures, innermost first
    pub fn closures(&self) -> impl Iterator<Item = &ClosureScope> {
        self.frames.iter().rev().filter_map(|frame| frame.closure.as_ref())
    }
}

fn bind_params(params: &[Param]) -> HashMap<String, TypeRef> {
    params
        .iter()
        .map(|param| (param.name.clone(), param.ty.clone()))
        .collect()
}

/// A method invocation as seen by the resolver
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'e> {
    pub method: &'e str,
    pub args: &'e [Expr],
    pub receiver: Option<&'e Expr>,
}

impl<'e> Invocation<'e> {
    /// View of an `Expr::MethodCall`
    pub fn of(expr: &'e Expr) -> Option<Self> {
        match expr {
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => Some(Self {
                method,
                args,
                receiver: receiver.as_deref(),
            }),
            _ => None,
        }
    }
}

/// How the resolved receiver was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// `task.setX(v)`
    Explicit,
    /// Bare `setX(v)` answered by the enclosing class or a closure owner
    ImplicitThis,
    /// Bare `setX(v)` answered by a closure delegate
    ImplicitDelegate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'i> {
    Resolved {
        record: &'i MigrationRecord,
        receiver: ReceiverKind,
    },
    /// Not a call to a migrated setter
    NoMatch,
    /// Receiver type could not be proven
    Ambiguous(String),
    /// Receiver resolved but the argument cannot be the property's type
    ArgumentMismatch(String),
}

enum Probe<'i> {
    Migrated(&'i MigrationRecord),
    /// The type declares a non-migrated method that answers the call
    Claimed,
    /// Fully known class without a matching method
    Absent(ClassId),
    Unprovable(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiverResolver<'i> {
    index: &'i MigratedSymbolIndex,
    table: &'i ClassTable,
}

impl<'i> ReceiverResolver<'i> {
    pub fn new(index: &'i MigratedSymbolIndex, table: &'i ClassTable) -> Self {
        Self { index, table }
    }

    /// One argument and named like a removed setter. Only these calls are
    /// worth resolving.
    pub fn is_setter_call(&self, invocation: &Invocation<'_>) -> bool {
        invocation.args.len() == 1 && self.index.is_known_setter(invocation.method)
    }

    pub fn resolve(&self, invocation: &Invocation<'_>, scope: &ScopeChain) -> Resolution<'i> {
        if !self.is_setter_call(invocation) {
            return Resolution::NoMatch;
        }
        let [argument] = invocation.args else {
            return Resolution::NoMatch;
        };

        let resolution = match invocation.receiver {
            Some(receiver) => self.resolve_explicit(invocation.method, receiver, scope),
            None => self.resolve_implicit(invocation.method, scope),
        };

        match resolution {
            Resolution::Resolved { record, receiver } => {
                match self.check_argument(argument, &record.original_type, scope) {
                    Ok(()) => Resolution::Resolved { record, receiver },
                    Err(detail) => Resolution::ArgumentMismatch(detail),
                }
            }
            other => other,
        }
    }

    fn resolve_explicit(&self, setter: &str, receiver: &Expr, scope: &ScopeChain) -> Resolution<'i> {
        let Some(ty) = self.infer(receiver, scope) else {
            return Resolution::Ambiguous(format!("cannot infer receiver type for {setter}"));
        };
        match ty.class_id() {
            Some(class) => match self.index.lookup_setter(&class, setter, self.table) {
                Some(record) => Resolution::Resolved {
                    record,
                    receiver: ReceiverKind::Explicit,
                },
                None => Resolution::NoMatch,
            },
            None if is_unprovable(&ty) => {
                Resolution::Ambiguous(format!("receiver of {setter} has unprovable type {ty}"))
            }
            None => Resolution::NoMatch,
        }
    }

    fn resolve_implicit(&self, setter: &str, scope: &ScopeChain) -> Resolution<'i> {
        // Classes passed over before the winner. The rewritten bare getter
        // call must not bind to any of them.
        let mut passed: Vec<ClassId> = Vec::new();

        for closure in scope.closures() {
            for candidate in closure.ranked_candidates() {
                let (probe, kind) = match candidate {
                    Candidate::Owner(owner) => (self.probe_class(owner, setter), ReceiverKind::ImplicitThis),
                    Candidate::Delegate(ty) => (self.probe_type(ty, setter), ReceiverKind::ImplicitDelegate),
                };
                match probe {
                    Probe::Migrated(record) => return self.implicit_resolution(record, kind, &passed),
                    Probe::Claimed => return Resolution::NoMatch,
                    Probe::Unprovable(detail) => return Resolution::Ambiguous(detail),
                    Probe::Absent(class) => passed.push(class),
                }
            }
            if closure.delegate_only() {
                return Resolution::NoMatch;
            }
        }

        match self.probe_class(scope.enclosing_class(), setter) {
            Probe::Migrated(record) => {
                self.implicit_resolution(record, ReceiverKind::ImplicitThis, &passed)
            }
            _ => Resolution::NoMatch,
        }
    }

    fn implicit_resolution(
        &self,
        record: &'i MigrationRecord,
        receiver: ReceiverKind,
        passed: &[ClassId],
    ) -> Resolution<'i> {
        let getter = record.getter.as_str();
        match passed
            .iter()
            .find(|class| self.table.declares_method(class, getter, 0))
        {
            Some(shadow) => Resolution::Ambiguous(format!(
                "{getter}() would bind to {shadow} instead of {}",
                record.class
            )),
            None => Resolution::Resolved { record, receiver },
        }
    }

    fn probe_type(&self, ty: &TypeRef, setter: &str) -> Probe<'i> {
        match ty.class_id() {
            Some(class) => self.probe_class(&class, setter),
            None if is_unprovable(ty) => {
                Probe::Unprovable(format!("delegate type {ty} cannot be resolved for {setter}"))
            }
            None => Probe::Unprovable(format!("delegate type {ty} is not a class")),
        }
    }

    fn probe_class(&self, class: &ClassId, setter: &str) -> Probe<'i> {
        if let Some(record) = self.index.lookup_setter(class, setter, self.table) {
            return Probe::Migrated(record);
        }
        if self.table.declares_method(class, setter, 1) {
            return Probe::Claimed;
        }
        if self.table.has_external_ancestor(class) {
            return Probe::Unprovable(format!(
                "{class} is or extends a class outside the program; cannot tell whether it answers {setter}"
            ));
        }
        Probe::Absent(class.clone())
    }

    /// Static type of an expression, where one can be established
    pub fn infer(&self, expr: &Expr, scope: &ScopeChain) -> Option<TypeRef> {
        match expr {
            Expr::Null => None,
            Expr::String(_) => Some(TypeRef::string()),
            Expr::Number(_) => Some(TypeRef::primitive("int")),
            Expr::Boolean(_) => Some(TypeRef::primitive("boolean")),
            Expr::This => Some(TypeRef::class(scope.enclosing_class().as_str())),
            Expr::Identifier { ty: Some(ty), .. } => Some(ty.clone()),
            Expr::Identifier { name, ty: None } => self.infer_identifier(name, scope),
            Expr::New { class, .. } => Some(class.clone()),
            Expr::Cast { ty, .. } => Some(ty.clone()),
            Expr::Assign { value, .. } => self.infer(value, scope),
            Expr::FieldAccess { target, name } => {
                let class = self.infer(target, scope)?.class_id()?;
                self.table.field_type(&class, name).cloned()
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                let class = match receiver {
                    Some(receiver) => self.infer(receiver, scope)?.class_id()?,
                    None => scope.enclosing_class().clone(),
                };
                self.table
                    .method_return(&class, method, args.len())
                    .filter(|ty| !ty.is_void())
                    .cloned()
            }
            Expr::Closure(_) => Some(TypeRef::class("groovy.lang.Closure")),
        }
    }

    fn infer_identifier(&self, name: &str, scope: &ScopeChain) -> Option<TypeRef> {
        if let Some(ty) = scope.lookup(name) {
            return Some(ty.clone());
        }
        if name == "it" {
            if let Some(closure) = scope.closures().next() {
                if closure.implicit_it {
                    return closure.delegate.as_ref().map(|hint| hint.ty.clone());
                }
            }
        }

        // Unqualified property reads go through the same owner/delegate
        // ranking as unqualified calls
        for closure in scope.closures() {
            for candidate in closure.ranked_candidates() {
                let class = match candidate {
                    Candidate::Owner(owner) => owner.clone(),
                    Candidate::Delegate(ty) => ty.class_id()?,
                };
                if let Some(ty) = self.table.field_type(&class, name) {
                    return Some(ty.clone());
                }
                let delegate = matches!(candidate, Candidate::Delegate(_));
                if delegate && self.table.has_external_ancestor(&class) {
                    return None;
                }
            }
            if closure.delegate_only() {
                return None;
            }
        }
        self.table.field_type(scope.enclosing_class(), name).cloned()
    }

    fn check_argument(&self, argument: &Expr, expected: &TypeRef, scope: &ScopeChain) -> Result<(), String> {
        if matches!(argument, Expr::Null) {
            return Ok(());
        }
        let Some(actual) = self.infer(argument, scope) else {
            return Ok(());
        };
        if self.assignable(&actual, expected) {
            Ok(())
        } else {
            Err(format!("{actual} argument cannot be assigned to {expected} property"))
        }
    }

    fn assignable(&self, actual: &TypeRef, expected: &TypeRef) -> bool {
        if is_unprovable(actual) || is_unprovable(expected) {
            return true;
        }
        let (actual, expected) = (naming::boxed(actual), naming::boxed(expected));
        let (Some(actual), Some(expected)) = (actual.class_id(), expected.class_id()) else {
            return false;
        };
        if same_class(&actual, &expected) || expected.as_str() == "java.lang.Object" {
            return true;
        }
        if widens(actual.as_str(), expected.as_str()) {
            return true;
        }
        self.table.is_subclass_of(&actual, &expected)
    }
}

/// Types that say nothing about the runtime class
fn is_unprovable(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Dynamic => true,
        TypeRef::TypeParam { bound, .. } => bound.as_deref().map_or(true, is_unprovable),
        _ => false,
    }
}

/// Qualified and simple spellings of the same class compare equal
fn same_class(a: &ClassId, b: &ClassId) -> bool {
    a == b || a.simple_name() == b.as_str() || a.as_str() == b.simple_name()
}

/// Numeric widening between boxed types
fn widens(from: &str, to: &str) -> bool {
    const ORDER: [&str; 6] = [
        "java.lang.Byte",
        "java.lang.Short",
        "java.lang.Integer",
        "java.lang.Long",
        "java.lang.Float",
        "java.lang.Double",
    ];
    let rank = |name: &str| ORDER.iter().position(|n| *n == name);
    matches!((rank(from), rank(to)), (Some(f), Some(t)) if f < t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClassDecl, FieldDecl, MethodDecl, Stmt};
    use crate::migrate::class_table::ClassInfo;

    const TASK: &str = "com.acme.TestTask";

    fn record() -> MigrationRecord {
        MigrationRecord {
            class: ClassId::new(TASK),
            property: "property".to_string(),
            original_type: TypeRef::string(),
            wrapper_type: TypeRef::generic(
                "org.gradle.api.provider.Property",
                vec![TypeRef::string()],
            ),
            mutation_method: "set".to_string(),
            getter: "getProperty".to_string(),
            setter: "setProperty".to_string(),
            unit: "TestTask.groovy".to_string(),
        }
    }

    fn fixtures() -> (MigratedSymbolIndex, ClassTable) {
        fixtures_with(Vec::new())
    }

    fn fixtures_with(extra: Vec<ClassDecl>) -> (MigratedSymbolIndex, ClassTable) {
        let mut index = MigratedSymbolIndex::new();
        index.insert(record());

        let mut table = ClassTable::new();
        let task = ClassDecl::new(TASK)
            .with_field(FieldDecl::new("property", TypeRef::string()))
            .with_method(MethodDecl::new("getProperty", TypeRef::string()))
            .with_method(
                MethodDecl::new("setProperty", TypeRef::Void)
                    .with_param(Param::new("value", TypeRef::string())),
            );
        let plugin = ClassDecl::new("com.acme.TestPlugin")
            .with_field(FieldDecl::new("task", TypeRef::class(TASK)))
            .with_method(MethodDecl::new("currentTask", TypeRef::class(TASK)));
        let other = ClassDecl::new("com.acme.Other").with_method(
            MethodDecl::new("setProperty", TypeRef::Void)
                .with_param(Param::new("value", TypeRef::string())),
        );
        let sub = ClassDecl::new("com.acme.SubTask").extends(TASK);
        for class in [task, plugin, other, sub].into_iter().chain(extra) {
            table.insert(ClassInfo::from_decl(&class));
        }
        (index, table)
    }

    fn plugin_scope() -> ScopeChain {
        let mut scope = ScopeChain::new(ClassId::new("com.acme.TestPlugin"));
        scope.push_method(&[]);
        scope
    }

    fn set_call(receiver: Option<Expr>, arg: Expr) -> Expr {
        Expr::MethodCall {
            receiver: receiver.map(Box::new),
            method: "setProperty".to_string(),
            args: vec![arg],
        }
    }

    fn resolve<'i>(resolver: &ReceiverResolver<'i>, call: &Expr, scope: &ScopeChain) -> Resolution<'i> {
        resolver.resolve(&Invocation::of(call).unwrap(), scope)
    }

    #[test]
    fn test_explicit_local_receiver() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        scope.bind("task", TypeRef::class(TASK));

        let call = set_call(Some(Expr::ident("task")), Expr::string("X"));
        match resolve(&resolver, &call, &scope) {
            Resolution::Resolved { record, receiver } => {
                assert_eq!(record.property, "property");
                assert_eq!(receiver, ReceiverKind::Explicit);
            }
            other => panic!("Expected Resolved, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_receiver_via_field_and_method_return() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let scope = plugin_scope();

        let via_field = set_call(Some(Expr::field(Expr::This, "task")), Expr::string("X"));
        assert!(matches!(resolve(&resolver, &via_field, &scope), Resolution::Resolved { .. }));

        let via_call = set_call(Some(Expr::bare_call("currentTask", vec![])), Expr::string("X"));
        assert!(matches!(resolve(&resolver, &via_call, &scope), Resolution::Resolved { .. }));

        let via_implicit_field = set_call(Some(Expr::ident("task")), Expr::string("X"));
        assert!(matches!(
            resolve(&resolver, &via_implicit_field, &scope),
            Resolution::Resolved { .. }
        ));
    }

    #[test]
    fn test_subclass_receiver_uses_base_record() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let call = set_call(
            Some(Expr::typed_ident("sub", TypeRef::class("com.acme.SubTask"))),
            Expr::string("X"),
        );
        assert!(matches!(resolve(&resolver, &call, &plugin_scope()), Resolution::Resolved { .. }));
    }

    #[test]
    fn test_unrelated_receiver_is_no_match() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let call = set_call(
            Some(Expr::typed_ident("other", TypeRef::class("com.acme.Other"))),
            Expr::string("X"),
        );
        assert_eq!(resolve(&resolver, &call, &plugin_scope()), Resolution::NoMatch);
    }

    #[test]
    fn test_dynamic_receiver_is_ambiguous() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        scope.bind("thing", TypeRef::Dynamic);

        let call = set_call(Some(Expr::ident("thing")), Expr::string("X"));
        assert!(matches!(resolve(&resolver, &call, &scope), Resolution::Ambiguous(_)));

        let unknown = set_call(Some(Expr::ident("nowhere")), Expr::string("X"));
        assert!(matches!(resolve(&resolver, &unknown, &scope), Resolution::Ambiguous(_)));
    }

    #[test]
    fn test_implicit_it_takes_delegate_type() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        let closure = Closure::new(vec![])
            .delegating_to(TypeRef::class(TASK), ResolveStrategy::DelegateFirst);
        scope.push_closure(&closure);

        let call = set_call(Some(Expr::ident("it")), Expr::string("X"));
        assert!(matches!(
            resolve(&resolver, &call, &scope),
            Resolution::Resolved { receiver: ReceiverKind::Explicit, .. }
        ));
    }

    #[test]
    fn test_bare_call_in_delegate_first_closure() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        let closure = Closure::new(vec![])
            .delegating_to(TypeRef::class(TASK), ResolveStrategy::DelegateFirst);
        scope.push_closure(&closure);

        let call = set_call(None, Expr::string("X"));
        assert!(matches!(
            resolve(&resolver, &call, &scope),
            Resolution::Resolved { receiver: ReceiverKind::ImplicitDelegate, .. }
        ));
    }

    #[test]
    fn test_owner_first_owner_claims_call() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = ScopeChain::new(ClassId::new("com.acme.Other"));
        scope.push_method(&[]);
        let closure = Closure::new(vec![])
            .delegating_to(TypeRef::class(TASK), ResolveStrategy::OwnerFirst);
        scope.push_closure(&closure);

        let call = set_call(None, Expr::string("X"));
        assert_eq!(resolve(&resolver, &call, &scope), Resolution::NoMatch);
    }

    #[test]
    fn test_delegate_first_beats_owner() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = ScopeChain::new(ClassId::new("com.acme.Other"));
        scope.push_method(&[]);
        let closure = Closure::new(vec![])
            .delegating_to(TypeRef::class(TASK), ResolveStrategy::DelegateFirst);
        scope.push_closure(&closure);

        let call = set_call(None, Expr::string("X"));
        assert!(matches!(
            resolve(&resolver, &call, &scope),
            Resolution::Resolved { receiver: ReceiverKind::ImplicitDelegate, .. }
        ));
    }

    #[test]
    fn test_external_delegate_is_ambiguous() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        let closure = Closure::new(vec![]).delegating_to(
            TypeRef::class("org.gradle.api.Project"),
            ResolveStrategy::DelegateFirst,
        );
        scope.push_closure(&closure);

        let call = set_call(None, Expr::string("X"));
        assert!(matches!(resolve(&resolver, &call, &scope), Resolution::Ambiguous(_)));
    }

    #[test]
    fn test_unrelated_delegate_falls_through_to_no_match() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        let closure = Closure::new(vec![]).delegating_to(
            TypeRef::class("com.acme.TestPlugin"),
            ResolveStrategy::DelegateFirst,
        );
        scope.push_closure(&closure);

        let call = set_call(None, Expr::string("X"));
        assert_eq!(resolve(&resolver, &call, &scope), Resolution::NoMatch);
    }

    #[test]
    fn test_nested_closures_innermost_first() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        let outer = Closure::new(vec![])
            .delegating_to(TypeRef::class(TASK), ResolveStrategy::DelegateFirst);
        let inner = Closure::new(vec![Stmt::Block(vec![])]).delegating_to(
            TypeRef::class("com.acme.Other"),
            ResolveStrategy::DelegateFirst,
        );
        scope.push_closure(&outer);
        scope.push_closure(&inner);
        assert_eq!(scope.closures().count(), 2);

        // Other declares its own setProperty and answers first
        let call = set_call(None, Expr::string("X"));
        assert_eq!(resolve(&resolver, &call, &scope), Resolution::NoMatch);

        scope.pop();
        assert!(matches!(resolve(&resolver, &call, &scope), Resolution::Resolved { .. }));
    }

    #[test]
    fn test_argument_type_must_fit() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let mut scope = plugin_scope();
        scope.bind("task", TypeRef::class(TASK));

        let wrong = set_call(Some(Expr::ident("task")), Expr::Number(3));
        assert!(matches!(resolve(&resolver, &wrong, &scope), Resolution::ArgumentMismatch(_)));

        let null = set_call(Some(Expr::ident("task")), Expr::Null);
        assert!(matches!(resolve(&resolver, &null, &scope), Resolution::Resolved { .. }));

        let unknown = set_call(Some(Expr::ident("task")), Expr::ident("mystery"));
        assert!(matches!(resolve(&resolver, &unknown, &scope), Resolution::Resolved { .. }));
    }

    #[test]
    fn test_wrong_arity_or_unknown_name_is_no_match() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let scope = plugin_scope();

        let two_args = Expr::call(
            Expr::typed_ident("task", TypeRef::class(TASK)),
            "setProperty",
            vec![Expr::string("a"), Expr::string("b")],
        );
        assert_eq!(resolve(&resolver, &two_args, &scope), Resolution::NoMatch);

        let other_name = Expr::call(
            Expr::typed_ident("task", TypeRef::class(TASK)),
            "setDescription",
            vec![Expr::string("a")],
        );
        assert_eq!(resolve(&resolver, &other_name, &scope), Resolution::NoMatch);
    }

    fn closure_in(class: &str, delegate: TypeRef, strategy: ResolveStrategy) -> ScopeChain {
        let mut scope = ScopeChain::new(ClassId::new(class));
        scope.push_method(&[]);
        scope.push_closure(&Closure::new(vec![]).delegating_to(delegate, strategy));
        scope
    }

    #[test]
    fn test_delegate_with_external_base_is_ambiguous() {
        let (index, table) = fixtures_with(vec![
            ClassDecl::new("com.acme.Ext").extends("org.gradle.api.ExternalBase")
        ]);
        let resolver = ReceiverResolver::new(&index, &table);
        let scope = closure_in(TASK, TypeRef::class("com.acme.Ext"), ResolveStrategy::DelegateFirst);

        let call = set_call(None, Expr::string("X"));
        assert!(matches!(resolve(&resolver, &call, &scope), Resolution::Ambiguous(_)));
    }

    #[test]
    fn test_owner_getter_shadows_delegate_property() {
        let plugin = ClassDecl::new("com.acme.Shadowing")
            .with_method(MethodDecl::new("getProperty", TypeRef::string()));
        let (index, table) = fixtures_with(vec![plugin]);
        let resolver = ReceiverResolver::new(&index, &table);
        let call = set_call(None, Expr::string("X"));

        let owner_first = closure_in("com.acme.Shadowing", TypeRef::class(TASK), ResolveStrategy::OwnerFirst);
        assert!(matches!(resolve(&resolver, &call, &owner_first), Resolution::Ambiguous(_)));

        // Delegate answers first, so the rewritten getter call binds to it too
        let delegate_first =
            closure_in("com.acme.Shadowing", TypeRef::class(TASK), ResolveStrategy::DelegateFirst);
        assert!(matches!(
            resolve(&resolver, &call, &delegate_first),
            Resolution::Resolved { receiver: ReceiverKind::ImplicitDelegate, .. }
        ));
    }

    #[test]
    fn test_owner_only_ignores_delegate() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let scope = closure_in("com.acme.TestPlugin", TypeRef::class(TASK), ResolveStrategy::OwnerOnly);

        let call = set_call(None, Expr::string("X"));
        assert_eq!(resolve(&resolver, &call, &scope), Resolution::NoMatch);
    }

    #[test]
    fn test_delegate_only_ignores_owner() {
        let (index, table) = fixtures();
        let resolver = ReceiverResolver::new(&index, &table);
        let call = set_call(None, Expr::string("X"));

        // Owner is migrated but never consulted
        let unrelated = closure_in(TASK, TypeRef::class("com.acme.TestPlugin"), ResolveStrategy::DelegateOnly);
        assert_eq!(resolve(&resolver, &call, &unrelated), Resolution::NoMatch);

        let migrated = closure_in("com.acme.TestPlugin", TypeRef::class(TASK), ResolveStrategy::DelegateOnly);
        assert!(matches!(
            resolve(&resolver, &call, &migrated),
            Resolution::Resolved { receiver: ReceiverKind::ImplicitDelegate, .. }
        ));
    }

    #[test]
    fn test_unqualified_field_follows_strategy() {
        let holder = ClassDecl::new("com.acme.Holder")
            .with_field(FieldDecl::new("target", TypeRef::class(TASK)));
        let owner = ClassDecl::new("com.acme.Owner")
            .with_field(FieldDecl::new("target", TypeRef::class("com.acme.Other")));
        let (index, table) = fixtures_with(vec![holder, owner]);
        let resolver = ReceiverResolver::new(&index, &table);
        let call = set_call(Some(Expr::ident("target")), Expr::string("X"));

        let delegate_first =
            closure_in("com.acme.Owner", TypeRef::class("com.acme.Holder"), ResolveStrategy::DelegateFirst);
        assert!(matches!(resolve(&resolver, &call, &delegate_first), Resolution::Resolved { .. }));

        let owner_first =
            closure_in("com.acme.Owner", TypeRef::class("com.acme.Holder"), ResolveStrategy::OwnerFirst);
        assert_eq!(resolve(&resolver, &call, &owner_first), Resolution::NoMatch);

        let external =
            closure_in("com.acme.Owner", TypeRef::class("org.gradle.api.Project"), ResolveStrategy::DelegateFirst);
        assert!(matches!(resolve(&resolver, &call, &external), Resolution::Ambiguous(_)));
    }

    #[test]
    fn test_widening_and_unprovable_types() {
        assert!(widens("java.lang.Integer", "java.lang.Long"));
        assert!(!widens("java.lang.Long", "java.lang.Integer"));
        assert!(is_unprovable(&TypeRef::type_param("T", None)));
        assert!(!is_unprovable(&TypeRef::type_param("T", Some(TypeRef::class(TASK)))));
    }
}
