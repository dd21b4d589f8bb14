use super::ParseTaskCategoryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of job a task describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Junk removal.
    JunkRemoval,
    /// Moving help.
    MovingHelp,
    /// Cleaning.
    Cleaning,
    /// Handyman work.
    Handyman,
    /// Plumbing.
    Plumbing,
    /// Electrical work.
    Electrical,
    /// Auto towing.
    AutoTowing,
    /// Furniture assembly.
    FurnitureAssembly,
    /// Deliveries and errands.
    DeliveryErrands,
    /// Yard work.
    YardWork,
    /// Painting.
    Painting,
    /// General repairs.
    RepairsGeneral,
    /// Computer and tech help.
    TechComputer,
    /// Urgent jobs, listed first and priced higher.
    Emergency,
    /// Anything else.
    Other,
}

impl TaskCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 15] = [
        Self::JunkRemoval,
        Self::MovingHelp,
        Self::Cleaning,
        Self::Handyman,
        Self::Plumbing,
        Self::Electrical,
        Self::AutoTowing,
        Self::FurnitureAssembly,
        Self::DeliveryErrands,
        Self::YardWork,
        Self::Painting,
        Self::RepairsGeneral,
        Self::TechComputer,
        Self::Emergency,
        Self::Other,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JunkRemoval => "junk_removal",
            Self::MovingHelp => "moving_help",
            Self::Cleaning => "cleaning",
            Self::Handyman => "handyman",
            Self::Plumbing => "plumbing",
            Self::Electrical => "electrical",
            Self::AutoTowing => "auto_towing",
            Self::FurnitureAssembly => "furniture_assembly",
            Self::DeliveryErrands => "delivery_errands",
            Self::YardWork => "yard_work",
            Self::Painting => "painting",
            Self::RepairsGeneral => "repairs_general",
            Self::TechComputer => "tech_computer",
            Self::Emergency => "emergency",
            Self::Other => "other",
        }
    }

    /// Returns `true` for the emergency category.
    #[must_use]
    pub const fn is_emergency(self) -> bool {
        matches!(self, Self::Emergency)
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = ParseTaskCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseTaskCategoryError(value.to_owned()))
    }
}
