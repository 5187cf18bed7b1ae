//! Plan-exercise model definition.

use serde::{Deserialize, Serialize};

use super::OrderMarker;

/// A prescribed movement within a session.
///
/// `id` identifies this plan-exercise; `exercise_id` references the catalog
/// exercise it prescribes. Rest values are in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanExercise {
    /// Unique identifier of the plan-exercise
    pub id: String,

    /// ID of the parent session
    pub session_id: String,

    /// Reference to the catalog exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_id: Option<String>,

    /// Sequencing label within the session ("A1", "B2", ...)
    pub order: OrderMarker,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_area: Option<String>,

    /// Display name or description of the movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Legacy single-value set count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,

    /// Legacy single-value rep count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,

    /// Legacy single-value rest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets_min: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets_max: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_min: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps_max: Option<u32>,

    /// Tempo prescription such as "3-1-1-0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_min: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_max: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customizations: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlanExercise {
    /// Creates an exercise with only its identity, parent and order set.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        order: impl Into<OrderMarker>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            order: order.into(),
            ..Default::default()
        }
    }

    /// Upper bound of the prescribed set count, falling back to the legacy
    /// value and then to the lower bound.
    pub fn effective_sets(&self) -> Option<u32> {
        self.sets_max.or(self.sets).or(self.sets_min)
    }

    /// Upper bound of the prescribed rest in seconds.
    pub fn effective_rest(&self) -> Option<u32> {
        self.rest_max.or(self.rest).or(self.rest_min)
    }
}
