/*!
# Property Migration Engine

Whole-program rewrite of plain getter/setter properties into immutable
wrapper properties.

## Architecture

- `PropertyMatcher`: finds field/getter/setter triples in one class
- `DeclarationRewriter`: wraps the field and getter type, drops the setter
- `MigratedSymbolIndex`: program-wide records of what was migrated
- `ClassTable`: superclasses, fields and method signatures for lookups
- `ReceiverResolver`: static receiver type of each setter call, including
  implicit receivers inside delegating closures
- `CallSiteRewriter`: turns `task.setX(v)` into `task.x.set(v)`
- `Migrator`: runs both phases with a barrier in between

## Example Usage

```rust,ignore
use propwrap_core::{MigrationConfig, Migrator};

let migrator = Migrator::new(MigrationConfig::default())?;
let outcome = migrator.run(&program)?;
for diagnostic in &outcome.report.diagnostics {
    println!("{diagnostic}");
}
```
*/

pub mod call_site;
pub mod class_table;
pub mod declaration;
pub mod index;
pub mod matcher;
pub mod naming;
pub mod orchestrator;
pub mod patterns;
pub mod report;
pub mod resolver;

pub use call_site::{rewrite_invocation, CallSiteRewriter};
pub use class_table::{ClassInfo, ClassTable};
pub use declaration::{DeclarationEdit, DeclarationRewriter};
pub use index::{InsertOutcome, MigratedSymbolIndex, MigrationRecord, RecordKey};
pub use matcher::{MatchOutcome, MigrationCandidate, PropertyMatcher};
pub use orchestrator::{MigrationOutcome, Migrator, RunState};
pub use patterns::{MethodPattern, NamePattern, PatternMatcher};
pub use report::{Diagnostic, DiagnosticKind, MigrationReport};
pub use resolver::{Invocation, ReceiverKind, ReceiverResolver, Resolution, ScopeChain};

use crate::ast::TypeRef;
use crate::config::MigrationConfig;
use crate::error::Result;

/// Validated configuration with its name patterns compiled. Shared
/// read-only by every phase and worker.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    config: MigrationConfig,
    marker: NamePattern,
    wrapper: NamePattern,
}

impl MigrationContext {
    pub fn new(config: MigrationConfig) -> Result<Self> {
        config.validate()?;
        let marker = NamePattern::for_qualified(&config.marker_annotation)?;
        let wrapper = NamePattern::for_qualified(&config.wrapper_type)?;
        Ok(Self {
            config,
            marker,
            wrapper,
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn marker(&self) -> &NamePattern {
        &self.marker
    }

    /// Whether a type is already the wrapper, whatever its type argument
    pub fn is_wrapper(&self, ty: &TypeRef) -> bool {
        self.wrapper.matches_type(ty)
    }

    /// `Wrapper<T>` with primitive `T` boxed
    pub fn wrap(&self, element: &TypeRef) -> TypeRef {
        TypeRef::generic(self.config.wrapper_type.clone(), vec![naming::boxed(element)])
    }

    pub fn mutation_method(&self) -> &str {
        &self.config.mutation_method
    }
}
