//! In-memory board storage using HashMap and the dependency graph.
//!
//! This backend holds all board state in RAM: initiatives in a `HashMap`
//! for O(1) lookups, the dependency edge set in a
//! [`crate::graph::DependencyGraph`], and todo rules grouped by owner. It
//! is suitable for testing, short-lived sessions, and as the reference
//! implementation of the [`BoardStorage`] contract; hosts with durable
//! persistence load their records through
//! [`BoardStorage::import_board`](crate::storage::BoardStorage::import_board)
//! and persist the edge set from
//! [`DependencyGraph::edges`](crate::graph::DependencyGraph::edges).
//!
//! # Thread Safety
//!
//! The storage is wrapped in `Arc<Mutex<BoardStorageInner>>`. Every
//! operation acquires the mutex once and performs its whole
//! read-check-write sequence under it, so two concurrent dependency
//! insertions can never both pass the cycle check against a stale view.
//!
//! # Performance Characteristics
//!
//! - Create / Read / Update: O(1)
//! - Delete: O(d) where d is the number of edges touching the initiative
//! - Add dependency: O(n + e) worst case (reverse reachability search)
//! - Blocked queries: O(d) per initiative (direct dependencies only)

mod inner;
mod trait_impl;

use crate::storage::BoardStorage;
use inner::BoardStorageInner;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory board storage.
///
/// This type alias wraps the inner storage in `Arc<Mutex<>>` for
/// thread-safe async access. It implements [`BoardStorage`] via the trait
/// implementation in `trait_impl.rs`.
pub(crate) type InMemoryBoard = Arc<Mutex<BoardStorageInner>>;

/// Create a new in-memory board storage instance.
///
/// # Arguments
///
/// * `prefix` - The prefix for initiative IDs (e.g., "plan")
///
/// # Example
///
/// ```
/// use trellis::storage::new_in_memory_board;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let board = new_in_memory_board("plan".to_string());
///     // Use board...
/// }
/// ```
#[must_use]
pub fn new_in_memory_board(prefix: String) -> Box<dyn BoardStorage> {
    Box::new(Arc::new(Mutex::new(BoardStorageInner::new(prefix))))
}
