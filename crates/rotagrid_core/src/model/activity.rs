//! Activity palette and role gating.
//!
//! # Responsibility
//! - Define the assignable activity record and its category.
//! - Map categories to closed style tokens for rendering.
//! - Gate palette membership by caller role.
//!
//! # Invariants
//! - Style tokens come from a closed enum-to-token table, never from string
//!   interpolation against an open palette.
//! - A role must never be offered an activity it cannot assign.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an assignable activity or rotation.
pub type ActivityId = Uuid;

/// Coarse classification used for theming and solver hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Clinical,
    Educational,
    Administrative,
    Research,
    TimeOff,
}

impl ActivityCategory {
    /// Closed style-token table for grid cell rendering.
    pub fn style_token(self) -> &'static str {
        match self {
            Self::Clinical => "slot-clinical",
            Self::Educational => "slot-educational",
            Self::Administrative => "slot-administrative",
            Self::Research => "slot-research",
            Self::TimeOff => "slot-time-off",
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Clinical => "clinical",
            Self::Educational => "educational",
            Self::Administrative => "administrative",
            Self::Research => "research",
            Self::TimeOff => "time_off",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value {
            "clinical" => Some(Self::Clinical),
            "educational" => Some(Self::Educational),
            "administrative" => Some(Self::Administrative),
            "research" => Some(Self::Research),
            "time_off" => Some(Self::TimeOff),
            _ => None,
        }
    }
}

/// One assignable activity in the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub category: ActivityCategory,
    /// Restricted activities may only be assigned by admins.
    pub restricted: bool,
}

impl Activity {
    /// Creates an unrestricted activity with a generated stable ID.
    pub fn new(name: impl Into<String>, category: ActivityCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category,
            restricted: false,
        }
    }
}

/// Caller role used to filter the assignable palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coordinator,
    Viewer,
}

impl Role {
    /// Whether this role may assign the given activity.
    pub fn can_assign(self, activity: &Activity) -> bool {
        match self {
            Self::Admin => true,
            Self::Coordinator => !activity.restricted,
            Self::Viewer => false,
        }
    }
}
