//! Storage abstraction layer for the planning board.
//!
//! This module provides the core storage trait for board state:
//! initiatives, the dependency edge set, and per-user todo rules. The one
//! shipped backend is in-memory (HashMap + [`crate::graph::DependencyGraph`]);
//! hosts with their own persistence implement the trait over it and load
//! board state through [`BoardStorage::import_board`].
//!
//! # Architecture
//!
//! The storage layer uses an async trait so both blocking (in-memory) and
//! truly async (database-backed) implementations fit behind the same
//! object-safe interface (`Box<dyn BoardStorage>`).
//!
//! # Concurrency contract
//!
//! Implementations must make every read-check-write sequence atomic with
//! respect to other mutators of the same board. In particular, two
//! concurrent [`BoardStorage::add_dependency`] calls must never both pass
//! the cycle check against a stale view and jointly introduce a cycle. The
//! in-memory backend serializes all operations behind one async mutex;
//! database-backed implementations need equivalent transactional isolation.
//!
//! # Example
//!
//! ```no_run
//! use trellis::storage::{BoardStorage, new_in_memory_board};
//! use trellis::domain::{InitiativeStatus, NewInitiative};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut board = new_in_memory_board("plan".to_string());
//!
//!     let new_initiative = NewInitiative {
//!         title: "Checkout revamp".to_string(),
//!         description: "Rework the checkout funnel".to_string(),
//!         external_url: None,
//!         team: None,
//!         project: None,
//!         status: InitiativeStatus::Upcoming,
//!         rag_status: None,
//!         expected_date: None,
//!     };
//!
//!     let initiative = board.create(new_initiative).await?;
//!     println!("Created initiative: {}", initiative.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{
    DependencyEdge, Initiative, InitiativeChange, InitiativeFilter, InitiativeId, InitiativeUpdate,
    NewInitiative, RuleId, UpdateOutcome, UserId,
};
use crate::error::Result;
use crate::rules::{TodoRule, TodoSuggestion};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;

// Storage backend implementations
pub mod in_memory;

pub use in_memory::new_in_memory_board;

/// Core storage trait for board state.
///
/// # Method Categories
///
/// - **Initiatives**: `create`, `get`, `update`, `delete`, `list`
/// - **Dependencies**: `add_dependency`, `remove_dependency`,
///   `dependencies`, `dependents`, `is_blocked`, `blocked_initiatives`
/// - **Rules**: `add_rule`, `remove_rule`, `active_rules`, `evaluate_change`
/// - **Bootstrap**: `import_board`
///
/// # Error Handling
///
/// All methods return `Result<T>` where the error type includes:
/// - `InitiativeNotFound`: requested initiative doesn't exist
/// - `SelfDependency` / `DuplicateDependency` / `CircularDependency`:
///   the dependency mutation was rejected; board state is unchanged
/// - `HasDependents`: cannot delete an initiative others depend on
/// - `Storage`: backend-specific errors
#[async_trait]
pub trait BoardStorage: Send + Sync {
    // ========== Initiative Operations ==========

    /// Create a new initiative.
    ///
    /// Generates a unique ID and sets creation timestamps.
    async fn create(&mut self, new_initiative: NewInitiative) -> Result<Initiative>;

    /// Get an initiative by ID, or `None` when it doesn't exist.
    async fn get(&self, id: &InitiativeId) -> Result<Option<Initiative>>;

    /// Apply an update and return the persisted initiative together with
    /// the recorded field transition.
    ///
    /// The returned [`InitiativeChange`] is ready to feed to
    /// [`BoardStorage::evaluate_change`]; writing an audit entry for the
    /// mutation stays the caller's job.
    async fn update(&mut self, id: &InitiativeId, updates: InitiativeUpdate)
    -> Result<UpdateOutcome>;

    /// Delete an initiative.
    ///
    /// Refuses with [`crate::error::Error::HasDependents`] while other
    /// initiatives depend on it; its own outgoing dependency edges are
    /// removed with it.
    async fn delete(&mut self, id: &InitiativeId) -> Result<()>;

    /// List initiatives matching the filter, most recently created first.
    async fn list(&self, filter: &InitiativeFilter) -> Result<Vec<Initiative>>;

    // ========== Dependency Operations ==========

    /// Record that `initiative` depends on `dependency`.
    ///
    /// Rejects self-edges, duplicate edges, and edges that would close a
    /// cycle; the edge set is unchanged on every failure path.
    async fn add_dependency(
        &mut self,
        initiative: &InitiativeId,
        dependency: &InitiativeId,
    ) -> Result<()>;

    /// Delete the dependency edge if present; no-op otherwise (idempotent).
    async fn remove_dependency(
        &mut self,
        initiative: &InitiativeId,
        dependency: &InitiativeId,
    ) -> Result<()>;

    /// Direct dependencies of the initiative.
    async fn dependencies(&self, id: &InitiativeId) -> Result<Vec<InitiativeId>>;

    /// Initiatives that directly declare a dependency on the argument.
    async fn dependents(&self, id: &InitiativeId) -> Result<HashSet<InitiativeId>>;

    /// Whether the initiative has at least one unfinished direct dependency.
    async fn is_blocked(&self, id: &InitiativeId) -> Result<bool>;

    /// Every non-done initiative with unfinished dependencies, paired with
    /// those blockers.
    async fn blocked_initiatives(&self) -> Result<Vec<(Initiative, Vec<Initiative>)>>;

    // ========== Rule Operations ==========

    /// Store a todo rule under its owner.
    async fn add_rule(&mut self, rule: TodoRule) -> Result<()>;

    /// Remove a rule by owner and ID; no-op when absent.
    async fn remove_rule(&mut self, owner: &UserId, rule_id: &RuleId) -> Result<()>;

    /// The owner's active rules.
    async fn active_rules(&self, owner: &UserId) -> Result<Vec<TodoRule>>;

    /// Evaluate a recorded transition against the owner's active rules.
    ///
    /// Rules and the dependent lookup are read under a single point-in-time
    /// view of the board, so a concurrent edge change is observed either
    /// fully or not at all.
    async fn evaluate_change(
        &self,
        owner: &UserId,
        change: &InitiativeChange,
        today: NaiveDate,
    ) -> Result<Vec<TodoSuggestion>>;

    // ========== Bootstrap ==========

    /// Load existing initiative records and dependency edge pairs.
    ///
    /// Edges that reference missing initiatives, duplicate or self edges,
    /// and edges that would close a cycle are skipped; each skip is
    /// reported as a [`LoadWarning`] while the rest of the board loads.
    async fn import_board(
        &mut self,
        initiatives: Vec<Initiative>,
        edges: Vec<DependencyEdge>,
    ) -> Result<Vec<LoadWarning>>;
}

/// A non-fatal problem encountered while loading board state.
///
/// Warnings surface data that was skipped to keep the loaded board
/// consistent; everything else loads normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// An edge references an initiative that is not in the loaded set.
    ///
    /// **Effect**: the edge is skipped; both endpoints that do exist are
    /// still loaded.
    MissingInitiative {
        /// The dependent end of the skipped edge
        initiative_id: InitiativeId,
        /// The dependency end of the skipped edge
        dependency_id: InitiativeId,
    },

    /// An edge names the same initiative on both ends.
    SelfDependency {
        /// The initiative named on both ends
        id: InitiativeId,
    },

    /// The same edge appears more than once in the input.
    DuplicateDependency {
        /// The dependent end of the repeated edge
        initiative_id: InitiativeId,
        /// The dependency end of the repeated edge
        dependency_id: InitiativeId,
    },

    /// Adding the edge would have created a circular reference.
    ///
    /// **Effect**: the edge is skipped to keep the graph acyclic; both
    /// initiatives are loaded.
    CircularDependency {
        /// The dependent end of the skipped edge
        initiative_id: InitiativeId,
        /// The dependency end of the skipped edge
        dependency_id: InitiativeId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInitiative {
                initiative_id,
                dependency_id,
            } => write!(
                f,
                "skipped edge {initiative_id} -> {dependency_id}: initiative missing"
            ),
            Self::SelfDependency { id } => {
                write!(f, "skipped edge {id} -> {id}: self dependency")
            }
            Self::DuplicateDependency {
                initiative_id,
                dependency_id,
            } => write!(
                f,
                "skipped edge {initiative_id} -> {dependency_id}: duplicate"
            ),
            Self::CircularDependency {
                initiative_id,
                dependency_id,
            } => write!(
                f,
                "skipped edge {initiative_id} -> {dependency_id}: would create a cycle"
            ),
        }
    }
}
