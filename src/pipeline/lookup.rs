use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::instrument;

use crate::config::LookupPolicy;
use crate::error::{LookupError, ReconcileError, Result};
use crate::model::{Dataset, Identifier, IdentifierSet, Record, ReconciliationIndex, TaskOutcome};
use crate::observe::PipelineObserver;

/// Collects every record of `master` carrying `identifier`, in master order.
pub fn lookup_identifier(
    identifier: &str,
    master: &[Record],
) -> std::result::Result<Dataset, LookupError> {
    if identifier.is_empty() {
        return Err(LookupError::EmptyIdentifier);
    }

    let matches: Dataset = master
        .iter()
        .filter(|record| record.identifier == identifier)
        .cloned()
        .collect();
    if matches.is_empty() {
        return Err(LookupError::IdentifierNotFound(identifier.to_string()));
    }
    Ok(matches)
}

/// Looks up every identifier on its own thread and returns the outcome queue.
///
/// The queue holds exactly one outcome per identifier and is closed once
/// every worker finished.
#[instrument(level = "info", skip_all, fields(identifiers = identifiers.len(), records = master.len()))]
pub fn lookup_round(identifiers: &IdentifierSet, master: &[Record]) -> Receiver<TaskOutcome> {
    spawn_lookups(identifiers, master, lookup_identifier)
}

fn spawn_lookups<F>(
    identifiers: &IdentifierSet,
    master: &[Record],
    lookup: F,
) -> Receiver<TaskOutcome>
where
    F: Fn(&str, &[Record]) -> std::result::Result<Dataset, LookupError> + Sync,
{
    let (sender, receiver) = mpsc::sync_channel(identifiers.len());
    let lookup = &lookup;

    thread::scope(|scope| {
        let handles: Vec<_> = identifiers
            .iter()
            .map(|identifier| {
                let sender = sender.clone();
                let handle = scope.spawn(move || {
                    let outcome = match lookup(identifier, master) {
                        Ok(dataset) => TaskOutcome::matched(identifier.clone(), dataset),
                        Err(failure) => TaskOutcome::failed(identifier.clone(), failure),
                    };
                    // capacity matches the worker count and the receiver outlives the scope
                    let _ = sender.send(outcome);
                });
                (identifier, handle)
            })
            .collect();

        for (identifier, handle) in handles {
            if handle.join().is_err() {
                // the worker never sent; report it as an outcome so the fan-in sees it
                let _ = sender.send(TaskOutcome::failed(
                    identifier.clone(),
                    LookupError::WorkerPanicked,
                ));
            }
        }
    });

    drop(sender);
    receiver
}

/// Result of draining a lookup round.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexAssembly {
    /// Entries inserted before the first fatal outcome.
    pub index: ReconciliationIndex,
    /// Identifiers skipped because nothing matched them.
    pub unmatched: Vec<Identifier>,
    /// First fatal outcome, if any.
    pub failure: Option<(Identifier, LookupError)>,
    /// Number of outcomes taken from the queue.
    pub drained: usize,
}

impl IndexAssembly {
    /// Converts the assembly into the finished index, or the fatal failure.
    pub fn into_result(self) -> Result<ReconciliationIndex> {
        match self.failure {
            Some((identifier, source)) => Err(ReconcileError::Aborted { identifier, source }),
            None => Ok(self.index),
        }
    }
}

/// Drains lookup outcomes into the reconciliation index.
///
/// Under [`LookupPolicy::SkipNotFound`] an `IdentifierNotFound` outcome is
/// recorded in `unmatched` and skipped. Any other failure, and every failure
/// under [`LookupPolicy::FailFast`], is fatal: it is kept as the assembly's
/// failure and nothing after it enters the index. The queue is drained to
/// the end either way.
pub fn assemble_index<I, O>(outcomes: I, policy: LookupPolicy, observer: &O) -> IndexAssembly
where
    I: IntoIterator<Item = TaskOutcome>,
    O: PipelineObserver + ?Sized,
{
    let mut assembly = IndexAssembly::default();

    for outcome in outcomes {
        assembly.drained += 1;
        if assembly.failure.is_some() {
            continue;
        }

        let TaskOutcome {
            identifier,
            dataset,
            failure,
        } = outcome;
        match failure {
            Some(failure) if failure.is_not_found() && policy == LookupPolicy::SkipNotFound => {
                observer.identifier_unmatched(&identifier);
                assembly.unmatched.push(identifier);
            }
            Some(failure) => {
                observer.lookup_aborted(&identifier, &failure);
                assembly.failure = Some((identifier, failure));
            }
            None if dataset.is_empty() => {}
            None => {
                assembly.index.insert(identifier, dataset);
            }
        }
    }

    assembly.unmatched.sort();
    observer.index_assembled(assembly.index.len(), assembly.unmatched.len());
    assembly
}
