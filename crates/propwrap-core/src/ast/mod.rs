// Typed program model consumed and produced by the migration engine.
// The upstream parser fills in declared types, annotations and closure
// delegate metadata; the downstream printer serialises it back to source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Fully qualified class name, e.g. `com.acme.BuildTask` or `Outer.Inner`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the qualified name
    pub fn simple_name(&self) -> &str {
        simple_name(&self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Source language of a compilation unit. Decides the shape of rewritten
/// call sites: Groovy has property-access sugar, Java does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    Groovy,
    Java,
}

/// A whole program: every compilation unit the migration may touch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub units: Vec<CompilationUnit>,
}

impl Program {
    pub fn new(units: Vec<CompilationUnit>) -> Self {
        Self { units }
    }

    /// Decode a program handed over by the upstream parser
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode the program for the downstream printer
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Depth-first search for a class by qualified name
    pub fn find_class(&self, id: &ClassId) -> Option<&ClassDecl> {
        self.units
            .iter()
            .flat_map(|unit| unit.classes.iter())
            .find_map(|class| class.find(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub path: String,
    #[serde(default)]
    pub dialect: Dialect,
    pub classes: Vec<ClassDecl>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<String>, dialect: Dialect, classes: Vec<ClassDecl>) -> Self {
        Self {
            path: path.into(),
            dialect,
            classes,
        }
    }

    pub fn groovy(path: impl Into<String>, classes: Vec<ClassDecl>) -> Self {
        Self::new(path, Dialect::Groovy, classes)
    }

    pub fn java(path: impl Into<String>, classes: Vec<ClassDecl>) -> Self {
        Self::new(path, Dialect::Java, classes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: ClassId,
    #[serde(default)]
    pub superclass: Option<ClassId>,
    pub members: Vec<ClassMember>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: ClassId::new(name),
            superclass: None,
            members: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(ClassId::new(superclass));
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.members.push(ClassMember::Field(field));
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.members.push(ClassMember::Method(method));
        self
    }

    pub fn with_nested(mut self, class: ClassDecl) -> Self {
        self.members.push(ClassMember::Class(class));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn nested(&self) -> impl Iterator<Item = &ClassDecl> {
        self.members.iter().filter_map(|member| match member {
            ClassMember::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods().find(|method| method.name == name)
    }

    fn find(&self, id: &ClassId) -> Option<&ClassDecl> {
        if &self.name == id {
            return Some(self);
        }
        self.nested().find_map(|nested| nested.find(id))
    }
}

/// Members keep their declaration order so the printer can reproduce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassMember {
    Field(FieldDecl),
    Method(MethodDecl),
    Class(ClassDecl),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Private,
    Package,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub initializer: Option<Expr>,
    /// `final` in Java/Groovy terms
    #[serde(default)]
    pub is_final: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Private,
            initializer: None,
            is_final: false,
        }
    }

    pub fn with_initializer(mut self, initializer: Expr) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn immutable(mut self) -> Self {
        self.is_final = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Qualified or simple name, whichever the parser could resolve
    pub name: String,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type,
            annotations: Vec::new(),
            visibility: Visibility::Public,
            body: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(Annotation::new(annotation));
        self
    }

    pub fn with_body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }
}

/// Declared or inferred static type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Void,
    /// `def`, or anything the parser could not type
    Dynamic,
    /// Primitive keyword: int, boolean, long, ...
    Primitive(String),
    /// Class type with optional type arguments
    Class { name: String, args: Vec<TypeRef> },
    /// Generic type variable, resolvable only through its bound
    TypeParam {
        name: String,
        bound: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args,
        }
    }

    pub fn primitive(keyword: impl Into<String>) -> Self {
        TypeRef::Primitive(keyword.into())
    }

    pub fn string() -> Self {
        Self::class("java.lang.String")
    }

    pub fn type_param(name: impl Into<String>, bound: Option<TypeRef>) -> Self {
        TypeRef::TypeParam {
            name: name.into(),
            bound: bound.map(Box::new),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void) || matches!(self, TypeRef::Primitive(k) if k == "void")
    }

    /// The class this type statically denotes. Type parameters resolve
    /// through their bound; `def` and unbounded parameters do not resolve.
    pub fn class_id(&self) -> Option<ClassId> {
        match self {
            TypeRef::Class { name, .. } => Some(ClassId::new(name.clone())),
            TypeRef::TypeParam { bound: Some(bound), .. } => bound.class_id(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Dynamic => f.write_str("def"),
            TypeRef::Primitive(keyword) => f.write_str(keyword),
            TypeRef::Class { name, args } => {
                f.write_str(simple_name(name))?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::TypeParam { name, .. } => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    /// Local variable declaration: `TestTask task = new TestTask()`
    Local {
        name: String,
        ty: TypeRef,
        init: Option<Expr>,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    // Literals
    Null,
    String(String),
    Number(i64),
    Boolean(bool),

    This,
    /// Variable, parameter or implicit field reference. `ty` is set when the
    /// parser attributed a static type to this occurrence.
    Identifier {
        name: String,
        ty: Option<TypeRef>,
    },
    FieldAccess {
        target: Box<Expr>,
        name: String,
    },
    MethodCall {
        receiver: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },
    New {
        class: TypeRef,
        args: Vec<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Closure(Closure),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier {
            name: name.into(),
            ty: None,
        }
    }

    pub fn typed_ident(name: impl Into<String>, ty: TypeRef) -> Self {
        Expr::Identifier {
            name: name.into(),
            ty: Some(ty),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    pub fn field(target: Expr, name: impl Into<String>) -> Self {
        Expr::FieldAccess {
            target: Box::new(target),
            name: name.into(),
        }
    }

    /// Call with an explicit receiver: `receiver.method(args)`
    pub fn call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: Some(Box::new(receiver)),
            method: method.into(),
            args,
        }
    }

    /// Call with no receiver: `method(args)`
    pub fn bare_call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: None,
            method: method.into(),
            args,
        }
    }

    pub fn new_instance(class: impl Into<String>) -> Self {
        Expr::New {
            class: TypeRef::class(class),
            args: Vec::new(),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Null or empty-string literal
    pub fn is_trivial_literal(&self) -> bool {
        match self {
            Expr::Null => true,
            Expr::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// How a closure resolves names that have no explicit receiver, in the
/// order the runtime would try them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveStrategy {
    #[default]
    OwnerFirst,
    DelegateFirst,
    OwnerOnly,
    DelegateOnly,
}

/// Statically declared delegate of a closure, e.g. from `@DelegatesTo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateHint {
    pub ty: TypeRef,
    #[serde(default)]
    pub strategy: ResolveStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub delegate: Option<DelegateHint>,
    pub body: Vec<Stmt>,
}

impl Closure {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            params: Vec::new(),
            delegate: None,
            body,
        }
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn delegating_to(mut self, ty: TypeRef, strategy: ResolveStrategy) -> Self {
        self.delegate = Some(DelegateHint { ty, strategy });
        self
    }
}

impl From<Closure> for Expr {
    fn from(closure: Closure) -> Self {
        Expr::Closure(closure)
    }
}

/// Last dot-separated segment of a qualified name
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
