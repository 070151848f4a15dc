pub mod config;
pub mod domain;
pub mod errors;
pub mod machine;
pub mod notify;

pub use domain::workflow::{
    SpecError, StepSpec, StepStatus, StepUpdate, Workflow, WorkflowId, WorkflowPatch,
    WorkflowSpec, WorkflowStatus, WorkflowStep,
};
pub use errors::WorkflowError;
pub use machine::{transition, TransitionError, TransitionOutcome};
pub use notify::{
    InMemoryNotificationTrigger, NoopNotificationTrigger, NotificationTrigger, TransitionEvent,
};
