//! Partial updates for phases, sessions and exercises.
//!
//! A patch field is `None` when the field did not change. Fields that are
//! themselves optional on the entity use a double option, so a patch can
//! carry "cleared" (`Some(None)`, serialized as `null`) as well as a new
//! value.

use serde::{Deserialize, Serialize};

use super::{OrderMarker, Phase, PlanExercise, Session};

/// Copies every listed field that differs between `old` and `new` into the
/// patch.
macro_rules! diff_fields {
    ($patch:ident, $old:ident, $new:ident; $($field:ident),+ $(,)?) => {
        $(
            if $old.$field != $new.$field {
                $patch.$field = Some($new.$field.clone());
            }
        )+
    };
}

/// Writes every field present in the patch onto the target.
macro_rules! apply_fields {
    ($patch:ident, $target:ident; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

/// Deserializes an explicit `null` as `Some(None)` instead of `None`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Changed fields of a phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhasePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

impl PhasePatch {
    /// Computes the fields of `new` that differ from `old`. The UI-only
    /// expanded flag is compared only when `track_ui_fields` is set.
    pub fn between(old: &Phase, new: &Phase, track_ui_fields: bool) -> Self {
        let mut patch = Self::default();
        diff_fields!(patch, old, new; name, is_active);
        if track_ui_fields {
            diff_fields!(patch, old, new; is_expanded);
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, phase: &mut Phase) {
        apply_fields!(self, phase; name, is_active, is_expanded);
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("is_active", self.is_active.is_some()),
            ("is_expanded", self.is_expanded.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// Changed fields of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub duration: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expanded: Option<bool>,
}

impl SessionPatch {
    /// Computes the fields of `new` that differ from `old`. The UI-only
    /// expanded flag is compared only when `track_ui_fields` is set.
    pub fn between(old: &Session, new: &Session, track_ui_fields: bool) -> Self {
        let mut patch = Self::default();
        diff_fields!(patch, old, new; name, duration);
        if track_ui_fields {
            diff_fields!(patch, old, new; is_expanded);
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, session: &mut Session) {
        apply_fields!(self, session; name, duration, is_expanded);
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("duration", self.duration.is_some()),
            ("is_expanded", self.is_expanded.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// Changed fields of a plan-exercise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExercisePatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub exercise_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderMarker>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub motion: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub target_area: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub sets: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub reps: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub rest: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub sets_min: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub sets_max: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub reps_min: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub reps_max: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub tempo: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub rest_min: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub rest_max: Option<Option<u32>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub customizations: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub additional_info: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option::deserialize"
    )]
    pub notes: Option<Option<String>>,
}

impl ExercisePatch {
    /// Computes the fields of `new` that differ from `old`.
    pub fn between(old: &PlanExercise, new: &PlanExercise) -> Self {
        let mut patch = Self::default();
        diff_fields!(
            patch, old, new;
            exercise_id, order, motion, target_area, description,
            sets, reps, rest, sets_min, sets_max, reps_min, reps_max,
            tempo, rest_min, rest_max, customizations, additional_info, notes,
        );
        patch
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, exercise: &mut PlanExercise) {
        apply_fields!(
            self, exercise;
            exercise_id, order, motion, target_area, description,
            sets, reps, rest, sets_min, sets_max, reps_min, reps_max,
            tempo, rest_min, rest_max, customizations, additional_info, notes,
        );
    }

    /// Names of the fields carried by the patch, in declaration order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("exercise_id", self.exercise_id.is_some()),
            ("order", self.order.is_some()),
            ("motion", self.motion.is_some()),
            ("target_area", self.target_area.is_some()),
            ("description", self.description.is_some()),
            ("sets", self.sets.is_some()),
            ("reps", self.reps.is_some()),
            ("rest", self.rest.is_some()),
            ("sets_min", self.sets_min.is_some()),
            ("sets_max", self.sets_max.is_some()),
            ("reps_min", self.reps_min.is_some()),
            ("reps_max", self.reps_max.is_some()),
            ("tempo", self.tempo.is_some()),
            ("rest_min", self.rest_min.is_some()),
            ("rest_max", self.rest_max.is_some()),
            ("customizations", self.customizations.is_some()),
            ("additional_info", self.additional_info.is_some()),
            ("notes", self.notes.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}
