//! Todo-suggestion rule engine.
//!
//! Users define [`TodoRule`]s that watch for specific field transitions on
//! initiatives. When the surrounding application persists a state-changing
//! update, it hands the recorded [`crate::domain::InitiativeChange`] to
//! [`evaluate`], which returns zero or more [`TodoSuggestion`]s for the UI
//! to offer as accept/dismiss. Nothing here persists anything; converting
//! an accepted suggestion into a todo is the caller's job.
//!
//! The trigger taxonomy is a closed tagged union with one variant per
//! event kind, so adding a kind is a compile-time-checked, one-place
//! change in the match inside [`Trigger::matches`].

mod engine;

pub use engine::evaluate;

use crate::domain::{InitiativeId, InitiativeStatus, RagStatus, RuleId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The transition or event a rule watches for.
///
/// Serialized with `trigger_type` as the tag, so the wire form carries
/// `trigger_type` / `trigger_from` / `trigger_to` fields. `None` bounds
/// act as wildcards. An unrecognized `trigger_type` deserializes to
/// [`Trigger::Unknown`], which never matches, so one malformed rule cannot
/// block evaluation of the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger_type", rename_all = "snake_case")]
pub enum Trigger {
    /// The health signal changed this update.
    RagStatusChanged {
        /// Required previous value, or any when `None`
        #[serde(default)]
        trigger_from: Option<RagStatus>,
        /// Required new value, or any when `None`
        #[serde(default)]
        trigger_to: Option<RagStatus>,
    },

    /// The lifecycle status changed this update.
    StatusChanged {
        /// Required previous value, or any when `None`
        #[serde(default)]
        trigger_from: Option<InitiativeStatus>,
        /// Required new value, or any when `None`
        #[serde(default)]
        trigger_to: Option<InitiativeStatus>,
    },

    /// The expected date changed and the old value was non-null.
    DeadlineChanged,

    /// The expected date has arrived or passed and the initiative is not done.
    DeadlineOverdue,

    /// The status moved into in_progress with no expected date set.
    DeadlineMissing,

    /// The status moved into in_progress with no health signal set.
    NoRagSet,

    /// The status changed and at least one other initiative depends on this one.
    StatusChangedNotifyDependents,

    /// The status changed and the new status is done.
    MovedToDone,

    /// Catch-all for unrecognized trigger types; never matches.
    #[serde(other)]
    Unknown,
}

/// The bare kind of a trigger, used to label suggestions with their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// See [`Trigger::RagStatusChanged`]
    RagStatusChanged,
    /// See [`Trigger::StatusChanged`]
    StatusChanged,
    /// See [`Trigger::DeadlineChanged`]
    DeadlineChanged,
    /// See [`Trigger::DeadlineOverdue`]
    DeadlineOverdue,
    /// See [`Trigger::DeadlineMissing`]
    DeadlineMissing,
    /// See [`Trigger::NoRagSet`]
    NoRagSet,
    /// See [`Trigger::StatusChangedNotifyDependents`]
    StatusChangedNotifyDependents,
    /// See [`Trigger::MovedToDone`]
    MovedToDone,
    /// See [`Trigger::Unknown`]
    Unknown,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RagStatusChanged => "rag_status_changed",
            Self::StatusChanged => "status_changed",
            Self::DeadlineChanged => "deadline_changed",
            Self::DeadlineOverdue => "deadline_overdue",
            Self::DeadlineMissing => "deadline_missing",
            Self::NoRagSet => "no_rag_set",
            Self::StatusChangedNotifyDependents => "status_changed_notify_dependents",
            Self::MovedToDone => "moved_to_done",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A user-scoped automation rule.
///
/// Rules are independent of each other; several may fire for the same
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoRule {
    /// Unique identifier for the rule
    pub id: RuleId,

    /// The user the rule belongs to
    pub owner: UserId,

    /// The watched transition, inlined as trigger_type/trigger_from/trigger_to
    #[serde(flatten)]
    pub trigger: Trigger,

    /// Todo body template; the literal token `{title}` is substituted with
    /// the initiative's title
    pub suggested_body: String,

    /// Deadline offset in days from the evaluation date
    pub suggested_deadline_days: u32,

    /// Inactive rules are skipped entirely
    pub is_active: bool,
}

/// A proposed follow-up todo, created transiently by [`evaluate`].
///
/// Discarded if dismissed; converted into a persisted todo by the caller
/// if accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoSuggestion {
    /// The initiative whose transition fired the rule
    pub initiative_id: InitiativeId,

    /// The initiative's title at evaluation time
    pub initiative_title: String,

    /// The rule that fired
    pub rule_id: RuleId,

    /// The kind of trigger that fired
    pub source: TriggerKind,

    /// Rendered todo body with `{title}` substituted
    pub body: String,

    /// Proposed deadline: evaluation date plus the rule's day offset
    pub deadline: NaiveDate,
}
