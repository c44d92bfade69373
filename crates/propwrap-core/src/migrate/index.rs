//! Migrated-symbol index: one record per migrated (class, property), insert
//! once, consulted by every call-site lookup after the matching phase.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::ast::{ClassId, TypeRef};

use super::class_table::ClassTable;
use super::naming;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordKey {
    pub class: ClassId,
    pub property: String,
}

impl RecordKey {
    pub fn new(class: ClassId, property: impl Into<String>) -> Self {
        Self {
            class,
            property: property.into(),
        }
    }
}

/// A property that was migrated to the wrapper shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    pub class: ClassId,
    pub property: String,
    pub original_type: TypeRef,
    pub wrapper_type: TypeRef,
    pub mutation_method: String,
    pub getter: String,
    /// The setter that no longer exists
    pub setter: String,
    /// Compilation unit holding the declaration
    pub unit: String,
}

impl MigrationRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.class.clone(), self.property.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Key already present; the existing record was kept
    Conflict,
}

#[derive(Debug, Clone, Default)]
pub struct MigratedSymbolIndex {
    records: IndexMap<RecordKey, MigrationRecord>,
    setter_names: HashSet<String>,
}

impl MigratedSymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: MigrationRecord) -> InsertOutcome {
        let key = record.key();
        if self.records.contains_key(&key) {
            debug!(class = %key.class, property = %key.property, "record already indexed");
            return InsertOutcome::Conflict;
        }
        debug!(class = %key.class, property = %key.property, "indexed migrated property");
        self.setter_names.insert(record.setter.clone());
        self.records.insert(key, record);
        InsertOutcome::Inserted
    }

    /// Exact lookup on the declaring class
    pub fn lookup(&self, class: &ClassId, property: &str) -> Option<&MigrationRecord> {
        self.records.get(&RecordKey::new(class.clone(), property))
    }

    /// Lookup that also accepts subclasses of the declaring class
    pub fn lookup_in_hierarchy(
        &self,
        class: &ClassId,
        property: &str,
        table: &ClassTable,
    ) -> Option<&MigrationRecord> {
        table
            .ancestors(class)
            .find_map(|id| self.lookup(&id, property))
    }

    /// Lookup by the removed setter's name
    pub fn lookup_setter(
        &self,
        class: &ClassId,
        setter: &str,
        table: &ClassTable,
    ) -> Option<&MigrationRecord> {
        if !self.is_known_setter(setter) {
            return None;
        }
        let property = naming::property_from_setter(setter)?;
        self.lookup_in_hierarchy(class, &property, table)
            .filter(|record| record.setter == setter)
    }

    /// Whether any migrated property had a setter with this name
    pub fn is_known_setter(&self, name: &str) -> bool {
        self.setter_names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MigrationRecord> {
        self.records.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ClassDecl;
    use crate::migrate::class_table::ClassInfo;

    fn record(class: &str, property: &str) -> MigrationRecord {
        let setter = format!("set{}{}", property[..1].to_uppercase(), &property[1..]);
        let getter = format!("get{}{}", property[..1].to_uppercase(), &property[1..]);
        MigrationRecord {
            class: ClassId::new(class),
            property: property.to_string(),
            original_type: TypeRef::string(),
            wrapper_type: TypeRef::generic(
                "org.gradle.api.provider.Property",
                vec![TypeRef::string()],
            ),
            mutation_method: "set".to_string(),
            getter,
            setter,
            unit: "Task.groovy".to_string(),
        }
    }

    #[test]
    fn test_insert_once() {
        let mut index = MigratedSymbolIndex::new();
        assert_eq!(index.insert(record("Task", "property")), InsertOutcome::Inserted);

        let mut duplicate = record("Task", "property");
        duplicate.unit = "Other.groovy".to_string();
        assert_eq!(index.insert(duplicate), InsertOutcome::Conflict);

        assert_eq!(index.len(), 1);
        let kept = index.lookup(&ClassId::new("Task"), "property").unwrap();
        assert_eq!(kept.unit, "Task.groovy");
    }

    #[test]
    fn test_lookup_through_superclass() {
        let mut table = ClassTable::new();
        table.insert(ClassInfo::from_decl(&ClassDecl::new("Base")));
        table.insert(ClassInfo::from_decl(&ClassDecl::new("Derived").extends("Base")));

        let mut index = MigratedSymbolIndex::new();
        index.insert(record("Base", "property"));

        let derived = ClassId::new("Derived");
        assert!(index.lookup(&derived, "property").is_none());
        let found = index.lookup_in_hierarchy(&derived, "property", &table).unwrap();
        assert_eq!(found.class, ClassId::new("Base"));
        assert!(index.lookup_setter(&derived, "setProperty", &table).is_some());
        assert!(index.lookup_setter(&derived, "setOther", &table).is_none());
    }

    #[test]
    fn test_unrelated_class_misses() {
        let table = ClassTable::new();
        let mut index = MigratedSymbolIndex::new();
        index.insert(record("Task", "property"));

        assert!(index.is_known_setter("setProperty"));
        assert!(index
            .lookup_setter(&ClassId::new("Unrelated"), "setProperty", &table)
            .is_none());
    }
}
