//! Domain model for the task lifecycle.

mod category;
mod code;
mod error;
mod payment;
mod pricing;
mod status;
mod task;

pub use category::TaskCategory;
pub use code::ConfirmationCode;
pub use error::{
    ParsePartyRoleError, ParseTaskCategoryError, ParseTaskStatusError, TaskDomainError,
};
pub use payment::{
    PaidTip, PaymentStatus, PendingHire, PendingTip, TaskPayment, TaskTimeline, TaskTip,
};
pub use pricing::PricingPolicy;
pub use status::{PartyRole, TaskAction, TaskStatus};
pub use task::{
    MAX_TASK_PHOTOS, PRICE_PROMPT_AFTER_HOURS, PersistedTaskData, ProofEvidence,
    TASK_LIFETIME_DAYS, Task, TaskDraft, TaskLocation, TaskParty, TaskRequirements,
};
