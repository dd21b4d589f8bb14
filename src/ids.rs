//! Identifier types shared by every marketplace context.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim()).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a marketplace user (poster or helper).
    UserId
);
define_id!(
    /// Unique identifier for a posted task.
    TaskId
);
define_id!(
    /// Unique identifier for a helper's offer on a task.
    OfferId
);
define_id!(
    /// Unique identifier for a poster/helper chat thread.
    ThreadId
);
define_id!(
    /// Unique identifier for a chat message.
    MessageId
);
define_id!(
    /// Unique identifier for an extra-work request.
    ExtraWorkId
);
define_id!(
    /// Unique identifier for a dispute.
    DisputeId
);
define_id!(
    /// Unique identifier for an activity log entry.
    ActivityId
);
define_id!(
    /// Unique identifier for an issued one-time code.
    OtpCodeId
);
define_id!(
    /// Unique identifier for a capture event held for manual reconciliation.
    UnreconciledEventId
);
