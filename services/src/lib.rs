pub mod error;
pub mod evaluation_service;
pub mod notifier;
pub mod question_generator;
pub mod scheduler;

pub use error::ServiceError;
pub use evaluation_service::{CreateDefinition, EvaluationService};
pub use scheduler::{Scheduler, SchedulerConfig};
