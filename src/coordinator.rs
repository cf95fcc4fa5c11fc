//! Owns the lifecycle of the current lookup for one table.
//!
//! Every distinct (options, refresh epoch) pair advances the [`Generation`] and spawns a
//! lookup tagged with it. Lookups report back as [`Settlement`]s over an mpsc channel and
//! the owner feeds them to [`LookupCoordinator::settle`] on its own loop. Only the
//! settlement carrying the current generation is applied; anything older is dropped
//! without touching state. All mutation happens on the owner, so the generation check
//! is the only synchronization.

use crate::debug::{self, cat};
use crate::endpoint::{LookupEndpoint, LookupError};
use crate::options::LookupOptions;
use crate::types::LookupResult;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// External refresh trigger. Bumping it re-runs the same query.
pub type RefreshEpoch = u64;

/// Receives failures of current lookups, once per failure.
pub type ErrorSink = Box<dyn FnMut(&LookupError) + Send>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet
    Idle,
    /// A lookup is outstanding; earlier result/error are still shown
    Loading,
    Settled,
    Failed,
}

/// What the view renders from.
#[derive(Clone, Debug)]
pub struct LookupState<T> {
    phase: Phase,
    result: Option<LookupResult<T>>,
    error: Option<LookupError>,
}

impl<T> LookupState<T> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Last committed page. Kept while loading and after failures.
    pub fn result(&self) -> Option<&LookupResult<T>> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&LookupError> {
        self.error.as_ref()
    }

    /// Phase implied by what has been committed so far.
    fn settled_phase(&self) -> Phase {
        match (&self.error, &self.result) {
            (Some(_), _) => Phase::Failed,
            (None, Some(_)) => Phase::Settled,
            (None, None) => Phase::Idle,
        }
    }
}

impl<T> Default for LookupState<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
            error: None,
        }
    }
}

/// A finished lookup on its way back to the owner.
#[derive(Debug)]
pub struct Settlement<T> {
    generation: Generation,
    outcome: Result<LookupResult<T>, LookupError>,
}

impl<T> Settlement<T> {
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettleOutcome {
    /// Current success, result replaced
    Committed,
    /// Current failure, error recorded and surfaced
    Failed,
    /// Superseded or torn down; nothing changed
    Stale,
}

pub struct LookupCoordinator<E: LookupEndpoint> {
    endpoint: Arc<E>,
    settle_tx: UnboundedSender<Settlement<E::Item>>,
    current: Generation,
    issued_for: Option<(LookupOptions, RefreshEpoch)>,
    state: LookupState<E::Item>,
    in_flight: Vec<(Generation, JoinHandle<()>)>,
    cancel_superseded: bool,
    error_sink: Option<ErrorSink>,
    torn_down: bool,
}

impl<E: LookupEndpoint> LookupCoordinator<E> {
    pub fn new(endpoint: Arc<E>, settle_tx: UnboundedSender<Settlement<E::Item>>) -> Self {
        Self {
            endpoint,
            settle_tx,
            current: Generation::default(),
            issued_for: None,
            state: LookupState::default(),
            in_flight: Vec::new(),
            cancel_superseded: false,
            error_sink: None,
            torn_down: false,
        }
    }

    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Abort superseded lookup tasks instead of letting them finish and be discarded.
    pub fn cancel_superseded(mut self, on: bool) -> Self {
        self.cancel_superseded = on;
        self
    }

    pub fn state(&self) -> &LookupState<E::Item> {
        &self.state
    }

    pub fn current_generation(&self) -> Generation {
        self.current
    }

    /// Lookups spawned and not yet settled, aborted or reaped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Start a lookup for `(options, epoch)` unless that exact pair is already current.
    ///
    /// `loading` is raised before this returns. Returns the generation of the new lookup.
    pub fn on_options_or_epoch_change(
        &mut self,
        options: &LookupOptions,
        epoch: RefreshEpoch,
    ) -> Option<Generation> {
        if self.torn_down {
            return None;
        }
        if let Some((prev_options, prev_epoch)) = &self.issued_for {
            if prev_options == options && *prev_epoch == epoch {
                debug::log(cat::LOOKUP, "options and epoch unchanged, no lookup");
                return None;
            }
        }

        self.current = self.current.next();
        let generation = self.current;
        self.issued_for = Some((options.clone(), epoch));
        self.state.phase = Phase::Loading;

        if self.cancel_superseded {
            for (superseded, handle) in self.in_flight.drain(..) {
                if debug::is(cat::LOOKUP) {
                    debug::log(cat::LOOKUP, format!("aborting superseded lookup {superseded}"));
                }
                handle.abort();
            }
        } else {
            self.in_flight.retain(|(_, handle)| !handle.is_finished());
        }

        if debug::is(cat::LOOKUP) {
            debug::log(
                cat::LOOKUP,
                format!(
                    "lookup {generation}: limit={} offset={} orderBy={} order={} epoch={epoch}",
                    options.limit(),
                    options.offset(),
                    options.order_by(),
                    options.order().as_api_str()
                ),
            );
        }

        let endpoint = Arc::clone(&self.endpoint);
        let settle_tx = self.settle_tx.clone();
        let options = options.clone();
        let handle = tokio::spawn(async move {
            let outcome = endpoint.lookup(&options).await;
            // Closed channel means the owner is gone.
            let _ = settle_tx.send(Settlement {
                generation,
                outcome,
            });
        });
        self.in_flight.push((generation, handle));

        Some(generation)
    }

    /// Apply a finished lookup if it is still the current one.
    pub fn settle(&mut self, settlement: Settlement<E::Item>) -> SettleOutcome {
        let Settlement {
            generation,
            outcome,
        } = settlement;
        self.in_flight.retain(|(g, _)| *g != generation);

        if self.torn_down || generation != self.current {
            if debug::is(cat::SETTLE) {
                debug::log(
                    cat::SETTLE,
                    format!(
                        "discarding stale lookup {generation} (current {}, ok={})",
                        self.current,
                        outcome.is_ok()
                    ),
                );
            }
            return SettleOutcome::Stale;
        }

        match outcome {
            Ok(result) => {
                if debug::is(cat::SETTLE) {
                    debug::log(
                        cat::SETTLE,
                        format!(
                            "commit {generation}: count={} total={}",
                            result.count, result.total
                        ),
                    );
                }
                self.state.result = Some(result);
                self.state.error = None;
                self.state.phase = Phase::Settled;
                SettleOutcome::Committed
            }
            Err(err) => {
                log::warn!("lookup {generation} failed: {err}");
                if let Some(sink) = self.error_sink.as_mut() {
                    sink(&err);
                }
                self.state.error = Some(err);
                self.state.phase = Phase::Failed;
                SettleOutcome::Failed
            }
        }
    }

    /// Stop caring about outstanding lookups. Later settlements are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if self.state.phase == Phase::Loading {
            self.state.phase = self.state.settled_phase();
        }
        for (generation, handle) in self.in_flight.drain(..) {
            if debug::is(cat::LOOKUP) {
                debug::log(cat::LOOKUP, format!("teardown aborts lookup {generation}"));
            }
            handle.abort();
        }
    }
}

impl<E: LookupEndpoint> Drop for LookupCoordinator<E> {
    fn drop(&mut self) {
        for (_, handle) in self.in_flight.drain(..) {
            handle.abort();
        }
    }
}

impl<E: LookupEndpoint> fmt::Debug for LookupCoordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCoordinator")
            .field("current", &self.current)
            .field("phase", &self.state.phase)
            .field("in_flight", &self.in_flight.len())
            .field("cancel_superseded", &self.cancel_superseded)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
