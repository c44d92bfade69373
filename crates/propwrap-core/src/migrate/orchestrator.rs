/*!
# Migrator - Two-Phase Program Rewrite

Phase one matches and rewrites declarations unit by unit, then merges the
per-unit records into the index and class table in program order. Phase two
rewrites call sites against the frozen index. Nothing crosses from one phase
to the next except through that merge.
*/

use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::unbounded;
use tracing::{debug, error, info, info_span};

use crate::ast::{ClassDecl, ClassMember, CompilationUnit, Program};
use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};

use super::call_site::CallSiteRewriter;
use super::class_table::{ClassInfo, ClassTable};
use super::declaration::DeclarationRewriter;
use super::index::{InsertOutcome, MigratedSymbolIndex, MigrationRecord};
use super::matcher::PropertyMatcher;
use super::report::{Diagnostic, DiagnosticKind, MigrationReport};
use super::MigrationContext;

/// Lifecycle of one run. Each state is entered exactly once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Matching,
    Indexed,
    CallSiteRewriting,
    Done,
}

impl RunState {
    pub fn next(self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::Matching),
            RunState::Matching => Some(RunState::Indexed),
            RunState::Indexed => Some(RunState::CallSiteRewriting),
            RunState::CallSiteRewriting => Some(RunState::Done),
            RunState::Done => None,
        }
    }
}

#[derive(Debug)]
struct MigrationRun {
    state: RunState,
}

impl MigrationRun {
    fn new() -> Self {
        Self {
            state: RunState::Idle,
        }
    }

    fn advance(&mut self, to: RunState) -> Result<()> {
        if self.state.next() != Some(to) {
            return Err(MigrationError::PhaseOrder {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, to = ?to, "run state");
        self.state = to;
        Ok(())
    }
}

/// Result of a run. The input program is never modified.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub program: Program,
    /// Index contents in insertion order
    pub records: Vec<MigrationRecord>,
    pub report: MigrationReport,
}

/// Phase-one output for one unit
struct UnitMatch {
    unit: CompilationUnit,
    records: Vec<MigrationRecord>,
    classes: Vec<ClassInfo>,
    report: MigrationReport,
}

pub struct Migrator {
    ctx: MigrationContext,
}

impl Migrator {
    pub fn new(config: MigrationConfig) -> Result<Self> {
        Ok(Self {
            ctx: MigrationContext::new(config)?,
        })
    }

    pub fn run(&self, program: &Program) -> Result<MigrationOutcome> {
        let span = info_span!("migration", units = program.units.len());
        let _guard = span.enter();
        let mut run = MigrationRun::new();

        run.advance(RunState::Matching)?;
        info!("matching property declarations");
        let matched = self.for_each_unit(&program.units, |unit| self.match_unit(unit))?;

        let mut index = MigratedSymbolIndex::new();
        let mut table = ClassTable::new();
        let mut report = MigrationReport::new();
        let mut units = Vec::with_capacity(matched.len());
        for partial in matched {
            for info in partial.classes {
                let id = info.id.clone();
                if !table.insert(info) {
                    debug!(class = %id, unit = %partial.unit.path, "class declared twice; keeping first");
                }
            }
            for record in partial.records {
                let (class, property) = (record.class.clone(), record.property.clone());
                match index.insert(record) {
                    InsertOutcome::Inserted => report.records_inserted += 1,
                    InsertOutcome::Conflict => report.push(Diagnostic::new(
                        DiagnosticKind::IndexConflict,
                        partial.unit.path.clone(),
                        Some(class),
                        format!("property '{property}' already migrated by an earlier unit"),
                    )),
                }
            }
            report.merge(partial.report);
            units.push(partial.unit);
        }

        run.advance(RunState::Indexed)?;
        info!(records = index.len(), classes = table.len(), "migrated-symbol index built");

        run.advance(RunState::CallSiteRewriting)?;
        let rewriter = CallSiteRewriter::new(&index, &table);
        let rewritten = self.for_each_unit(&units, |unit| rewriter.rewrite_unit(unit))?;
        let mut program = Program::new(Vec::with_capacity(rewritten.len()));
        for (unit, partial) in rewritten {
            report.merge(partial);
            program.units.push(unit);
        }

        run.advance(RunState::Done)?;
        info!(
            declarations = report.declarations_rewritten,
            call_sites = report.call_sites_rewritten,
            diagnostics = report.diagnostics.len(),
            "migration complete"
        );

        Ok(MigrationOutcome {
            program,
            records: index.into_records(),
            report,
        })
    }

    fn match_unit(&self, unit: &CompilationUnit) -> UnitMatch {
        let mut partial = UnitMatch {
            unit: CompilationUnit::new(unit.path.clone(), unit.dialect, Vec::new()),
            records: Vec::new(),
            classes: Vec::new(),
            report: MigrationReport::new(),
        };
        let classes = unit
            .classes
            .iter()
            .map(|class| self.match_class(class, &mut partial))
            .collect();
        partial.unit.classes = classes;
        partial
    }

    fn match_class(&self, class: &ClassDecl, partial: &mut UnitMatch) -> ClassDecl {
        let path = partial.unit.path.clone();
        partial.report.classes_visited += 1;
        partial.classes.push(ClassInfo::from_decl(class));

        let outcome = PropertyMatcher::new(&self.ctx).match_class(class, &path);
        partial.report.candidates_matched += outcome.candidates.len() as u64;
        for rejection in outcome.rejections {
            debug!(class = %class.name, reason = %rejection.detail, "candidate rejected");
            partial.report.push(rejection);
        }

        let (mut rewritten, records) = DeclarationRewriter::new(&self.ctx).rewrite_class(
            class,
            &outcome.candidates,
            &path,
            &mut partial.report,
        );
        partial.records.extend(records);

        rewritten.members = rewritten
            .members
            .into_iter()
            .map(|member| match member {
                ClassMember::Class(nested) => ClassMember::Class(self.match_class(&nested, partial)),
                other => other,
            })
            .collect();
        rewritten
    }

    /// Run `task` once per unit and return the results in unit order. Uses
    /// up to `max_workers` threads pulling units off a shared queue.
    fn for_each_unit<T, F>(&self, units: &[CompilationUnit], task: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&CompilationUnit) -> T + Sync,
    {
        let config = self.ctx.config();
        let workers = config.max_workers.min(units.len());
        if !config.parallel || workers <= 1 {
            return Ok(units.iter().map(task).collect());
        }

        let (job_tx, job_rx) = unbounded::<usize>();
        let (result_tx, result_rx) = unbounded::<(usize, T)>();
        for index in 0..units.len() {
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(units.len()).collect();
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let task = &task;
                scope.spawn(move || {
                    for index in jobs.iter() {
                        let unit = &units[index];
                        match panic::catch_unwind(AssertUnwindSafe(|| task(unit))) {
                            Ok(value) => {
                                if results.send((index, value)).is_err() {
                                    break;
                                }
                            }
                            Err(_) => error!(unit = %unit.path, "worker panicked"),
                        }
                    }
                });
            }
            drop(result_tx);

            for (index, value) in result_rx.iter() {
                slots[index] = Some(value);
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| MigrationError::WorkerPanicked {
                    unit: units[index].path.clone(),
                })
            })
            .collect()
    }
}
