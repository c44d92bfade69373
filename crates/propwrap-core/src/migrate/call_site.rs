//! Call-site rewriting: every resolved `setX(v)` becomes a mutation of the
//! wrapper property. Runs per compilation unit against a frozen index.

use tracing::debug;

use crate::ast::{
    ClassDecl, ClassMember, Closure, CompilationUnit, Dialect, Expr, FieldDecl, MethodDecl, Stmt,
    TypeRef,
};

use super::class_table::ClassTable;
use super::index::{MigratedSymbolIndex, MigrationRecord};
use super::report::{Diagnostic, DiagnosticKind, MigrationReport};
use super::resolver::{Invocation, ReceiverResolver, Resolution, ScopeChain};

/// Replacement expression for one setter invocation.
///
/// With a receiver, Groovy reads the property directly (`task.property.set(v)`)
/// while Java goes through the getter (`task.getProperty().set(v)`). Without
/// one, both dialects call the getter on the implicit receiver.
pub fn rewrite_invocation(
    record: &MigrationRecord,
    receiver: Option<Expr>,
    argument: Expr,
    dialect: Dialect,
) -> Expr {
    let wrapper = match (receiver, dialect) {
        (Some(receiver), Dialect::Groovy) => Expr::field(receiver, record.property.clone()),
        (Some(receiver), Dialect::Java) => Expr::call(receiver, record.getter.clone(), Vec::new()),
        (None, _) => Expr::bare_call(record.getter.clone(), Vec::new()),
    };
    Expr::call(wrapper, record.mutation_method.clone(), vec![argument])
}

pub struct CallSiteRewriter<'i> {
    resolver: ReceiverResolver<'i>,
}

impl<'i> CallSiteRewriter<'i> {
    pub fn new(index: &'i MigratedSymbolIndex, table: &'i ClassTable) -> Self {
        Self {
            resolver: ReceiverResolver::new(index, table),
        }
    }

    /// Rewrite every call site in one unit. The input unit is not modified.
    pub fn rewrite_unit(&self, unit: &CompilationUnit) -> (CompilationUnit, MigrationReport) {
        let mut walk = UnitWalk {
            resolver: self.resolver,
            unit: &unit.path,
            dialect: unit.dialect,
            report: MigrationReport::new(),
        };
        let classes = unit.classes.iter().map(|class| walk.class(class)).collect();
        let rewritten = CompilationUnit {
            path: unit.path.clone(),
            dialect: unit.dialect,
            classes,
        };
        (rewritten, walk.report)
    }
}

struct UnitWalk<'a, 'i> {
    resolver: ReceiverResolver<'i>,
    unit: &'a str,
    dialect: Dialect,
    report: MigrationReport,
}

impl<'i> UnitWalk<'_, 'i> {
    fn class(&mut self, class: &ClassDecl) -> ClassDecl {
        let members = class
            .members
            .iter()
            .map(|member| match member {
                ClassMember::Field(field) => ClassMember::Field(self.field(class, field)),
                ClassMember::Method(method) => ClassMember::Method(self.method(class, method)),
                ClassMember::Class(nested) => ClassMember::Class(self.class(nested)),
            })
            .collect();

        ClassDecl {
            name: class.name.clone(),
            superclass: class.superclass.clone(),
            members,
        }
    }

    fn field(&mut self, class: &ClassDecl, field: &FieldDecl) -> FieldDecl {
        let mut scope = ScopeChain::new(class.name.clone());
        let mut rewritten = field.clone();
        rewritten.initializer = field
            .initializer
            .as_ref()
            .map(|init| self.expr(init, &mut scope));
        rewritten
    }

    fn method(&mut self, class: &ClassDecl, method: &MethodDecl) -> MethodDecl {
        let mut scope = ScopeChain::new(class.name.clone());
        scope.push_method(&method.params);
        let body = self.stmts(&method.body, &mut scope);
        scope.pop();

        let mut rewritten = method.clone();
        rewritten.body = body;
        rewritten
    }

    fn stmts(&mut self, stmts: &[Stmt], scope: &mut ScopeChain) -> Vec<Stmt> {
        stmts.iter().map(|stmt| self.stmt(stmt, scope)).collect()
    }

    fn block(&mut self, stmts: &[Stmt], scope: &mut ScopeChain) -> Vec<Stmt> {
        scope.push_block();
        let stmts = self.stmts(stmts, scope);
        scope.pop();
        stmts
    }

    fn stmt(&mut self, stmt: &Stmt, scope: &mut ScopeChain) -> Stmt {
        match stmt {
            Stmt::Expr(expr) => Stmt::Expr(self.expr(expr, scope)),
            Stmt::Local { name, ty, init } => {
                // `def x = new Foo()` is as good as `Foo x`
                let bound = match (ty, init) {
                    (TypeRef::Dynamic, Some(init)) => self
                        .resolver
                        .infer(init, scope)
                        .unwrap_or(TypeRef::Dynamic),
                    _ => ty.clone(),
                };
                let init = init.as_ref().map(|init| self.expr(init, scope));
                scope.bind(name.clone(), bound);
                Stmt::Local {
                    name: name.clone(),
                    ty: ty.clone(),
                    init,
                }
            }
            Stmt::Return(value) => Stmt::Return(value.as_ref().map(|value| self.expr(value, scope))),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => Stmt::If {
                condition: self.expr(condition, scope),
                then_branch: self.block(then_branch, scope),
                else_branch: else_branch
                    .as_ref()
                    .map(|branch| self.block(branch, scope)),
            },
            Stmt::Block(stmts) => Stmt::Block(self.block(stmts, scope)),
        }
    }

    fn expr(&mut self, expr: &Expr, scope: &mut ScopeChain) -> Expr {
        match expr {
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                // Resolve against the original node; children are rewritten after
                let record = Invocation::of(expr).and_then(|invocation| self.resolve(&invocation, scope));
                let receiver = receiver.as_deref().map(|receiver| self.expr(receiver, scope));
                let mut args: Vec<Expr> = args.iter().map(|arg| self.expr(arg, scope)).collect();

                match record {
                    Some(record) if args.len() == 1 => {
                        let argument = args.remove(0);
                        rewrite_invocation(record, receiver, argument, self.dialect)
                    }
                    _ => Expr::MethodCall {
                        receiver: receiver.map(Box::new),
                        method: method.clone(),
                        args,
                    },
                }
            }
            Expr::FieldAccess { target, name } => Expr::FieldAccess {
                target: Box::new(self.expr(target, scope)),
                name: name.clone(),
            },
            Expr::New { class, args } => Expr::New {
                class: class.clone(),
                args: args.iter().map(|arg| self.expr(arg, scope)).collect(),
            },
            Expr::Cast { ty, expr } => Expr::Cast {
                ty: ty.clone(),
                expr: Box::new(self.expr(expr, scope)),
            },
            Expr::Assign { target, value } => Expr::Assign {
                target: Box::new(self.expr(target, scope)),
                value: Box::new(self.expr(value, scope)),
            },
            Expr::Closure(closure) => {
                scope.push_closure(closure);
                let body = self.stmts(&closure.body, scope);
                scope.pop();
                Expr::Closure(Closure {
                    params: closure.params.clone(),
                    delegate: closure.delegate.clone(),
                    body,
                })
            }
            Expr::Null
            | Expr::String(_)
            | Expr::Number(_)
            | Expr::Boolean(_)
            | Expr::This
            | Expr::Identifier { .. } => expr.clone(),
        }
    }

    fn resolve(&mut self, invocation: &Invocation<'_>, scope: &ScopeChain) -> Option<&'i MigrationRecord> {
        if !self.resolver.is_setter_call(invocation) {
            return None;
        }

        match self.resolver.resolve(invocation, scope) {
            Resolution::Resolved { record, receiver } => {
                debug!(
                    unit = self.unit,
                    class = %record.class,
                    property = %record.property,
                    receiver = ?receiver,
                    "rewrote setter call"
                );
                self.report.call_sites_rewritten += 1;
                Some(record)
            }
            Resolution::NoMatch => {
                self.report.call_sites_skipped += 1;
                None
            }
            Resolution::Ambiguous(detail) => {
                debug!(unit = self.unit, method = invocation.method, %detail, "left setter call unrewritten");
                self.diagnose(DiagnosticKind::AmbiguousReceiver, scope, detail);
                None
            }
            Resolution::ArgumentMismatch(detail) => {
                debug!(unit = self.unit, method = invocation.method, %detail, "argument does not fit property");
                self.diagnose(DiagnosticKind::ArgumentMismatch, scope, detail);
                None
            }
        }
    }

    fn diagnose(&mut self, kind: DiagnosticKind, scope: &ScopeChain, detail: String) {
        self.report.push(Diagnostic::new(
            kind,
            self.unit,
            Some(scope.enclosing_class().clone()),
            detail,
        ));
    }
}
