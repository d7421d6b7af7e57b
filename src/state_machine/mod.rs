mod job;
mod state;

pub use job::{JobId, PollAttempt, PollSchedule, ReferenceList, RunReport};
pub use state::{
    Failure, InvalidTransition, OrchestrationState, RunOutcome, RunStart, StateMachine, Transition,
};
