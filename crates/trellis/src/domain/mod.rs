//! Domain types for the initiative planning board.
//!
//! This module contains the core domain types for trellis: initiatives,
//! their lifecycle/health statuses, dependency edge records, and the
//! before/after snapshots consumed by the rule engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted initiative title length, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Unique identifier for an initiative
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InitiativeId(pub String);

impl InitiativeId {
    /// Create a new initiative ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InitiativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InitiativeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InitiativeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to a team owning an initiative.
///
/// Team records live in the surrounding application; trellis only carries
/// the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    /// Create a new team ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a project grouping initiatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Create a new project ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning a set of todo rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a todo rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    /// Create a new rule ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of planned work on the board.
///
/// Initiatives reference teams and projects by identifier only and never
/// embed their dependency edges; the edge set lives in
/// [`crate::graph::DependencyGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    /// Unique identifier for the initiative
    pub id: InitiativeId,

    /// Initiative title
    pub title: String,

    /// Free-text description
    pub description: String,

    /// Link to an external tracker (optional)
    pub external_url: Option<String>,

    /// Owning team (optional)
    pub team: Option<TeamId>,

    /// Parent project (optional)
    pub project: Option<ProjectId>,

    /// Lifecycle status
    pub status: InitiativeStatus,

    /// Red/Amber/Green health signal, independently settable (optional)
    pub rag_status: Option<RagStatus>,

    /// Expected completion date, calendar date with no time component (optional)
    pub expected_date: Option<NaiveDate>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Initiative {
    /// Capture the rule-relevant fields as a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self) -> InitiativeSnapshot {
        InitiativeSnapshot {
            status: self.status,
            rag_status: self.rag_status,
            expected_date: self.expected_date,
        }
    }

    /// Validate the initiative's data integrity.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the title is blank or too long.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_title(&self.title)
    }
}

/// Lifecycle status of an initiative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeStatus {
    /// Planned but not started
    Upcoming,

    /// Currently being worked on
    InProgress,

    /// Completed
    Done,
}

impl fmt::Display for InitiativeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upcoming => write!(f, "upcoming"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Red/Amber/Green health indicator.
///
/// Independent of [`InitiativeStatus`]; set by humans, never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    /// Off track
    Red,

    /// At risk
    Amber,

    /// On track
    Green,
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Amber => write!(f, "amber"),
            Self::Green => write!(f, "green"),
        }
    }
}

/// A directed "depends on" relation between two initiatives.
///
/// `initiative_id` cannot be considered unblocked until `dependency_id`
/// reaches [`InitiativeStatus::Done`]. This is the interchange form used
/// when loading an existing edge set into the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The dependent initiative
    pub initiative_id: InitiativeId,

    /// The initiative being depended upon
    pub dependency_id: InitiativeId,
}

/// Data for creating a new initiative
#[derive(Debug, Clone)]
pub struct NewInitiative {
    /// Initiative title
    pub title: String,

    /// Free-text description
    pub description: String,

    /// Link to an external tracker (optional)
    pub external_url: Option<String>,

    /// Owning team (optional)
    pub team: Option<TeamId>,

    /// Parent project (optional)
    pub project: Option<ProjectId>,

    /// Initial lifecycle status
    pub status: InitiativeStatus,

    /// Initial health signal (optional)
    pub rag_status: Option<RagStatus>,

    /// Expected completion date (optional)
    pub expected_date: Option<NaiveDate>,
}

impl NewInitiative {
    /// Validate the new initiative data before creation.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the title is blank or too long.
    pub fn validate(&self) -> std::result::Result<(), String> {
        validate_title(&self.title)
    }
}

/// Data for updating an existing initiative.
///
/// Clearable optional fields use `Option<Option<T>>`: the outer `None`
/// leaves the field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct InitiativeUpdate {
    /// New title (if updating)
    pub title: Option<String>,

    /// New description (if updating)
    pub description: Option<String>,

    /// New external tracker link (if updating, `Some(None)` to clear)
    pub external_url: Option<Option<String>>,

    /// New owning team (if updating, `Some(None)` to clear)
    pub team: Option<Option<TeamId>>,

    /// New parent project (if updating, `Some(None)` to clear)
    pub project: Option<Option<ProjectId>>,

    /// New lifecycle status (if updating)
    pub status: Option<InitiativeStatus>,

    /// New health signal (if updating, `Some(None)` to clear)
    pub rag_status: Option<Option<RagStatus>>,

    /// New expected date (if updating, `Some(None)` to clear)
    pub expected_date: Option<Option<NaiveDate>>,
}

/// Filter for querying initiatives
#[derive(Debug, Clone, Default)]
pub struct InitiativeFilter {
    /// Filter by owning team
    pub team: Option<TeamId>,

    /// Filter by parent project
    pub project: Option<ProjectId>,

    /// Filter by lifecycle status
    pub status: Option<InitiativeStatus>,

    /// Filter by health signal
    pub rag_status: Option<RagStatus>,

    /// Limit number of results
    pub limit: Option<usize>,
}

/// Point-in-time values of the fields the rule engine watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeSnapshot {
    /// Lifecycle status at snapshot time
    pub status: InitiativeStatus,

    /// Health signal at snapshot time
    pub rag_status: Option<RagStatus>,

    /// Expected date at snapshot time
    pub expected_date: Option<NaiveDate>,
}

/// A recorded field transition on an initiative.
///
/// Fields that did not change in the update hold equal values in both
/// snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeChange {
    /// The initiative the update was applied to
    pub initiative_id: InitiativeId,

    /// Title at the time of the update (used for suggestion bodies)
    pub title: String,

    /// Field values before the update
    pub before: InitiativeSnapshot,

    /// Field values after the update
    pub after: InitiativeSnapshot,
}

impl InitiativeChange {
    /// True when the lifecycle status changed in this update.
    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.before.status != self.after.status
    }

    /// True when the status changed *into* the given value this update.
    #[must_use]
    pub fn entered_status(&self, status: InitiativeStatus) -> bool {
        self.status_changed() && self.after.status == status
    }

    /// True when the health signal changed in this update.
    #[must_use]
    pub fn rag_changed(&self) -> bool {
        self.before.rag_status != self.after.rag_status
    }
}

/// Result of applying an [`InitiativeUpdate`] through storage.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The initiative as persisted after the update
    pub initiative: Initiative,

    /// The recorded transition, ready to feed to the rule engine
    pub change: InitiativeChange,
}

fn validate_title(title: &str) -> std::result::Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        ));
    }
    Ok(())
}
