//! The single shared orchestration state and the run tokens guarding it.

use std::fmt;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::state_machine::{
    InvalidTransition, OrchestrationState, RunStart, StateMachine, Transition,
};

const HISTORY_CAPACITY: usize = 64;

/// Identifies one submission or watch run. Writes carrying any other
/// token than the slot's current one are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(Uuid);

impl RunToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What observers see: the state and the run that wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub run: RunToken,
    pub state: OrchestrationState,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlotError {
    #[error("run {0} was superseded")]
    Stale(RunToken),

    #[error(transparent)]
    Invalid(#[from] InvalidTransition),
}

/// Holds the live [`OrchestrationState`].
///
/// Every write happens under the watch channel's lock, so the token check,
/// the transition and the broadcast to the history stream are one atomic step.
pub struct StateSlot {
    current: watch::Sender<Snapshot>,
    history: broadcast::Sender<Snapshot>,
}

impl Default for StateSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSlot {
    pub fn new() -> Self {
        let (current, _) = watch::channel(Snapshot {
            run: RunToken::new(),
            state: OrchestrationState::Idle,
        });
        let (history, _) = broadcast::channel(HISTORY_CAPACITY);
        Self { current, history }
    }

    /// Claim the slot for a new run. Any previous run becomes stale.
    pub fn begin(&self, start: RunStart) -> RunToken {
        let run = RunToken::new();
        let state = StateMachine::start(start);
        self.current.send_modify(|snapshot| {
            *snapshot = Snapshot { run, state };
            let _ = self.history.send(snapshot.clone());
        });
        run
    }

    /// Apply an in-run event on behalf of `run`.
    pub fn apply(&self, run: RunToken, event: Transition) -> Result<OrchestrationState, SlotError> {
        let mut outcome = Err(SlotError::Stale(run));
        self.current.send_if_modified(|snapshot| {
            if snapshot.run != run {
                return false;
            }
            match StateMachine::next(&snapshot.state, event) {
                Ok(next) => {
                    snapshot.state = next.clone();
                    let _ = self.history.send(snapshot.clone());
                    outcome = Ok(next);
                    true
                }
                Err(err) => {
                    outcome = Err(SlotError::Invalid(err));
                    false
                }
            }
        });
        outcome
    }

    pub fn is_current(&self, run: RunToken) -> bool {
        self.current.borrow().run == run
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current.borrow().clone()
    }

    /// Latest-value view of the slot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.current.subscribe()
    }

    /// Ordered stream of every snapshot written from now on.
    pub fn transitions(&self) -> broadcast::Receiver<Snapshot> {
        self.history.subscribe()
    }
}
