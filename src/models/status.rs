//! Enumerated string columns.
//!
//! Status-like columns are stored as plain strings; these enums are the typed
//! view used at the API edge for validation and in queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Raised when a string does not name any variant of a status enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not one of: {}", expected.join(", "))]
pub struct ParseStatusError {
    pub value: String,
    pub expected: &'static [&'static str],
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Accepted wire values, in declaration order
            pub const NAMES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ParseStatusError {
                        value: value.to_string(),
                        expected: Self::NAMES,
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Whether a detection algorithm is currently running
    AlgorithmStatus {
        Online => "online",
        Offline => "offline",
    }
}

impl AlgorithmStatus {
    /// The status an algorithm moves to when toggled
    pub fn toggled(self) -> Self {
        match self {
            AlgorithmStatus::Online => AlgorithmStatus::Offline,
            AlgorithmStatus::Offline => AlgorithmStatus::Online,
        }
    }
}

string_enum! {
    /// Health of a camera feed
    CameraStatus {
        Online => "online",
        Offline => "offline",
        Warning => "warning",
    }
}

string_enum! {
    /// Severity classification of an event log
    RiskLevel {
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

string_enum! {
    /// Handling state of an event log
    EventStatus {
        Handled => "handled",
        Pending => "pending",
        Observing => "observing",
    }
}

string_enum! {
    /// Access tier of a user profile
    Role {
        Admin => "admin",
        Operator => "operator",
        Viewer => "viewer",
    }
}

string_enum! {
    UserStatus {
        Active => "active",
        Inactive => "inactive",
    }
}
