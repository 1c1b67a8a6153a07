pub mod auto_advance;
pub mod calendar;
pub mod error;
pub mod model;
pub mod repo;
pub mod scheduler;
pub mod spoc;
pub mod store;
pub mod transitions;

pub use auto_advance::{AutoAdvanceConfig, AutoAdvanceRunner, RunOutcome, RunReport, RunTrigger};
pub use error::JobsError;
pub use model::{Job, JobSnapshot, JobStatus, NewJob};
pub use repo::JobsRepo;
pub use scheduler::{ScheduleConfig, StatusScheduler};
pub use spoc::SpocRepo;
pub use store::{InMemoryJobStore, JobStore};
