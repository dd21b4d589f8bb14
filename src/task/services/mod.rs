//! Application services for the task lifecycle.

mod lifecycle;
mod requests;
mod sweep;

pub use lifecycle::TaskLifecycleService;
pub use requests::{CreateTaskRequest, HireCheckout, OpenDisputeRequest, TaskListQuery};
pub use sweep::{PricePromptSweep, SweepReport};
