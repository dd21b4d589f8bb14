//! Request and response payloads for task lifecycle operations.

use crate::payments::domain::{FeeSplit, HoldSession, Money};
use crate::task::domain::{
    Task, TaskCategory, TaskDraft, TaskLocation, TaskRequirements, TaskStatus,
};
use crate::task::ports::TaskFilter;
use chrono::{DateTime, Utc};

/// Request payload for posting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    category: TaskCategory,
    zip_code: String,
    area_description: Option<String>,
    full_address: Option<String>,
    price: Money,
    requirements: TaskRequirements,
    photos: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: TaskCategory,
        zip_code: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            category,
            zip_code: zip_code.into(),
            area_description: None,
            full_address: None,
            price,
            requirements: TaskRequirements::default(),
            photos: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the free-text area description.
    #[must_use]
    pub fn with_area_description(mut self, area: impl Into<String>) -> Self {
        self.area_description = Some(area.into());
        self
    }

    /// Sets the precise address.
    #[must_use]
    pub fn with_full_address(mut self, address: impl Into<String>) -> Self {
        self.full_address = Some(address.into());
        self
    }

    /// Sets the requirement flags.
    #[must_use]
    pub const fn with_requirements(mut self, requirements: TaskRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Sets the photo URLs.
    #[must_use]
    pub fn with_photos(mut self, photos: impl IntoIterator<Item = String>) -> Self {
        self.photos = photos.into_iter().collect();
        self
    }
}

impl From<CreateTaskRequest> for TaskDraft {
    fn from(request: CreateTaskRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            category: request.category,
            location: TaskLocation {
                zip_code: request.zip_code,
                area_description: request.area_description,
                full_address: request.full_address,
            },
            price: request.price,
            requirements: request.requirements,
            photos: request.photos,
        }
    }
}

/// Discovery query for open tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Restrict to a status.
    pub status: Option<TaskStatus>,
    /// Restrict to a ZIP code.
    pub zip_code: Option<String>,
    /// Restrict to a category.
    pub category: Option<TaskCategory>,
    /// Restrict on the tools-required flag.
    pub tools_required: Option<bool>,
    /// Restrict on the tools-provided flag.
    pub tools_provided: Option<bool>,
    /// Include tasks past their expiry.
    pub include_expired: bool,
}

impl TaskListQuery {
    pub(super) fn into_filter(self, now: DateTime<Utc>) -> TaskFilter {
        TaskFilter {
            status: self.status,
            zip_code: self
                .zip_code
                .map(|zip| zip.trim().to_owned())
                .filter(|zip| !zip.is_empty()),
            category: self.category,
            tools_required: self.tools_required,
            tools_provided: self.tools_provided,
            poster_id: None,
            helper_id: None,
            unexpired_at: (!self.include_expired).then_some(now),
            emergency_first: true,
        }
    }
}

/// An opened hire checkout awaiting the payer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HireCheckout {
    /// Task with the pending hire recorded.
    pub task: Task,
    /// Checkout session the poster must complete.
    pub session: HoldSession,
    /// Fee split of the hold.
    pub split: FeeSplit,
}

/// Dispute opening input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDisputeRequest {
    /// Reason given by the initiator.
    pub reason: Option<String>,
    /// Initiator's photo evidence.
    pub photo_urls: Vec<String>,
}
