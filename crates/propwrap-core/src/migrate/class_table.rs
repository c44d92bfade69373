//! Program-wide view of declared classes: superclass chains, field types and
//! method signatures. Built from the input program during the matching phase
//! and read-only afterwards.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{ClassDecl, ClassId, TypeRef};

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSig {
    pub name: String,
    pub arity: usize,
    pub return_type: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub id: ClassId,
    pub superclass: Option<ClassId>,
    pub fields: IndexMap<String, TypeRef>,
    pub methods: Vec<MethodSig>,
}

impl ClassInfo {
    pub fn from_decl(class: &ClassDecl) -> Self {
        Self {
            id: class.name.clone(),
            superclass: class.superclass.clone(),
            fields: class
                .fields()
                .map(|field| (field.name.clone(), field.ty.clone()))
                .collect(),
            methods: class
                .methods()
                .map(|method| MethodSig {
                    name: method.name.clone(),
                    arity: method.params.len(),
                    return_type: method.return_type.clone(),
                })
                .collect(),
        }
    }

    /// Info for a class and all classes nested in it
    pub fn collect(class: &ClassDecl, out: &mut Vec<ClassInfo>) {
        out.push(Self::from_decl(class));
        for nested in class.nested() {
            Self::collect(nested, out);
        }
    }

    fn method(&self, name: &str, arity: usize) -> Option<&MethodSig> {
        self.methods
            .iter()
            .find(|sig| sig.name == name && sig.arity == arity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: IndexMap<ClassId, ClassInfo>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// First declaration of a qualified name wins
    pub fn insert(&mut self, info: ClassInfo) -> bool {
        if self.classes.contains_key(&info.id) {
            return false;
        }
        self.classes.insert(info.id.clone(), info);
        true
    }

    pub fn get(&self, id: &ClassId) -> Option<&ClassInfo> {
        self.classes.get(id)
    }

    pub fn contains(&self, id: &ClassId) -> bool {
        self.classes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The class itself followed by its declared superclasses. Stops at the
    /// first class outside the program, after yielding it, and on cycles.
    pub fn ancestors<'t>(&'t self, id: &ClassId) -> Ancestors<'t> {
        Ancestors {
            table: self,
            next: Some(id.clone()),
            seen: HashSet::new(),
        }
    }

    pub fn is_subclass_of(&self, class: &ClassId, ancestor: &ClassId) -> bool {
        self.ancestors(class).any(|id| &id == ancestor)
    }

    /// Whether the chain reaches a class the program does not declare,
    /// including the class itself. Members of such a class are unknown.
    pub fn has_external_ancestor(&self, class: &ClassId) -> bool {
        self.ancestors(class).any(|id| !self.contains(&id))
    }

    pub fn field_type(&self, class: &ClassId, field: &str) -> Option<&TypeRef> {
        self.ancestors(class)
            .filter_map(|id| self.classes.get(&id))
            .find_map(|info| info.fields.get(field))
    }

    pub fn method_return(&self, class: &ClassId, method: &str, arity: usize) -> Option<&TypeRef> {
        self.ancestors(class)
            .filter_map(|id| self.classes.get(&id))
            .find_map(|info| info.method(method, arity))
            .map(|sig| &sig.return_type)
    }

    pub fn declares_method(&self, class: &ClassId, method: &str, arity: usize) -> bool {
        self.method_return(class, method, arity).is_some()
    }
}

pub struct Ancestors<'t> {
    table: &'t ClassTable,
    next: Option<ClassId>,
    seen: HashSet<ClassId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next.take()?;
        if !self.seen.insert(current.clone()) {
            return None;
        }
        self.next = self
            .table
            .classes
            .get(&current)
            .and_then(|info| info.superclass.clone());
        Some(current)
    }
}
