pub mod context;
pub mod error;
pub mod policy;
pub mod runner;
pub mod step;
pub mod storage;
pub mod wizard;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use policy::FailurePolicy;
pub use runner::WizardRunner;
pub use step::{Step, StepAction, StepResult};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use wizard::{ExecutionResult, ExecutionStatus, Wizard, WizardBuilder};
