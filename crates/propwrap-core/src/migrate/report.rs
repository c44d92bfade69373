/*!
# Run Report

Counters and diagnostics for one migration run. Every condition the engine
absorbs instead of failing ends up here, so a caller can see what was left
for manual follow-up.
*/

use std::fmt;

use serde::Serialize;

use crate::ast::ClassId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Receiver type of a setter call could not be proven
    AmbiguousReceiver,
    /// Marker-annotated getter without its field or setter
    MalformedCandidate,
    /// Second record for an already indexed (class, property)
    IndexConflict,
    /// Argument type cannot be assigned to the migrated property
    ArgumentMismatch,
    /// Non-trivial field initializer kept on a migrated field
    CarriedInitializer,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::AmbiguousReceiver => "ambiguous receiver",
            DiagnosticKind::MalformedCandidate => "malformed candidate",
            DiagnosticKind::IndexConflict => "index conflict",
            DiagnosticKind::ArgumentMismatch => "argument mismatch",
            DiagnosticKind::CarriedInitializer => "carried initializer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Compilation unit path
    pub unit: String,
    pub class: Option<ClassId>,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        unit: impl Into<String>,
        class: Option<ClassId>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            unit: unit.into(),
            class,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{}: {} [{}]: {}", self.unit, self.kind, class, self.detail),
            None => write!(f, "{}: {}: {}", self.unit, self.kind, self.detail),
        }
    }
}

/// Summary of one migration run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub classes_visited: u64,
    pub candidates_matched: u64,
    pub records_inserted: u64,
    pub declarations_rewritten: u64,
    pub setters_removed: u64,
    pub initializers_dropped: u64,
    pub call_sites_rewritten: u64,
    /// Calls named like a migrated setter that resolved to something else
    pub call_sites_skipped: u64,
    pub ambiguous_receivers: u64,
    pub malformed_candidates: u64,
    pub index_conflicts: u64,
    pub argument_mismatches: u64,
    pub carried_initializers: u64,
    pub diagnostics: Vec<Diagnostic>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and bump its counter
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::AmbiguousReceiver => self.ambiguous_receivers += 1,
            DiagnosticKind::MalformedCandidate => self.malformed_candidates += 1,
            DiagnosticKind::IndexConflict => self.index_conflicts += 1,
            DiagnosticKind::ArgumentMismatch => self.argument_mismatches += 1,
            DiagnosticKind::CarriedInitializer => self.carried_initializers += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: MigrationReport) {
        self.classes_visited += other.classes_visited;
        self.candidates_matched += other.candidates_matched;
        self.records_inserted += other.records_inserted;
        self.declarations_rewritten += other.declarations_rewritten;
        self.setters_removed += other.setters_removed;
        self.initializers_dropped += other.initializers_dropped;
        self.call_sites_rewritten += other.call_sites_rewritten;
        self.call_sites_skipped += other.call_sites_skipped;
        self.ambiguous_receivers += other.ambiguous_receivers;
        self.malformed_candidates += other.malformed_candidates;
        self.index_conflicts += other.index_conflicts;
        self.argument_mismatches += other.argument_mismatches;
        self.carried_initializers += other.carried_initializers;
        self.diagnostics.extend(other.diagnostics);
    }

    /// Whether the run rewrote anything at all
    pub fn changed(&self) -> bool {
        self.declarations_rewritten > 0 || self.call_sites_rewritten > 0
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}
