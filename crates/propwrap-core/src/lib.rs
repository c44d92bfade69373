//! # Propwrap Core
//!
//! Whole-program migration of plain Java/Groovy bean properties to lazy
//! wrapper properties, including:
//! - Source model for compilation units, classes and expressions
//! - Candidate matching and declaration rewriting
//! - Receiver resolution through closures and delegates
//! - Call-site rewriting against a program-wide index
//!
//! The crate works on an already parsed tree. Parsing and printing are the
//! caller's business; trees can be handed over as JSON.

#![warn(clippy::all)]

pub mod ast;
pub mod config;
pub mod error;
pub mod migrate;

// Re-export commonly used types
pub use ast::{
    ClassDecl, ClassId, ClassMember, Closure, CompilationUnit, Dialect, Expr, FieldDecl,
    MethodDecl, Program, ResolveStrategy, Stmt, TypeRef,
};
pub use config::MigrationConfig;
pub use error::{MigrationError, Result};
pub use migrate::{
    Diagnostic, DiagnosticKind, MigrationOutcome, MigrationRecord, MigrationReport, Migrator,
    RunState,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the migration engine. `RUST_LOG` overrides the
/// default `propwrap_core=info` filter. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("propwrap_core=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load a JSON program, migrate it and return the outcome
pub fn migrate_json(program_json: &str, config: MigrationConfig) -> Result<MigrationOutcome> {
    let program = Program::from_json_str(program_json)?;
    Migrator::new(config)?.run(&program)
}
