//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all board
//! state and is wrapped in `Arc<Mutex<>>` for thread safety.

use crate::domain::{Initiative, InitiativeId, NewInitiative, UserId};
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::id_generation::{IdGenerator, IdGeneratorConfig};
use crate::rules::TodoRule;
use std::collections::HashMap;

/// Inner storage structure (not thread-safe).
///
/// This contains the actual data structures for storing initiatives, the
/// dependency edge set, and per-user todo rules. It's wrapped in
/// `Arc<Mutex<>>` for thread safety.
pub(crate) struct BoardStorageInner {
    /// Initiatives indexed by ID for O(1) lookups
    pub(super) initiatives: HashMap<InitiativeId, Initiative>,

    /// The "depends on" edge set; see the graph module for direction
    /// conventions and invariants.
    pub(super) graph: DependencyGraph,

    /// Todo rules grouped by owning user
    pub(super) rules: HashMap<UserId, Vec<TodoRule>>,

    /// ID generator for creating new initiative IDs
    pub(super) id_generator: IdGenerator,

    /// Prefix for initiative IDs (e.g., "plan")
    prefix: String,
}

impl BoardStorageInner {
    /// Create a new empty storage instance
    pub(crate) fn new(prefix: String) -> Self {
        let config = IdGeneratorConfig {
            prefix: prefix.clone(),
            board_size: 0,
        };

        Self {
            initiatives: HashMap::new(),
            graph: DependencyGraph::new(),
            rules: HashMap::new(),
            id_generator: IdGenerator::new(config),
            prefix,
        }
    }

    /// Update the ID generator's board size if we've crossed a threshold.
    ///
    /// ID length changes at 500 and 1500 initiatives, so we only need to
    /// update when crossing these boundaries. This avoids O(n)
    /// re-registration on every create.
    pub(super) fn update_id_generator_if_needed(&mut self) {
        let current_size = self.initiatives.len();
        let old_size = self.id_generator.board_size();

        // Determine if we've crossed a length threshold
        let needs_update = match (old_size, current_size) {
            // Crossing 500 boundary (4 -> 5 chars)
            (0..=500, 501..) => true,
            // Crossing 1500 boundary (5 -> 6 chars)
            (0..=1500, 1501..) => true,
            // Crossing backwards (rare, but possible after deletes)
            (501.., 0..=500) => true,
            (1501.., 0..=1500) => true,
            _ => false,
        };

        if needs_update {
            // Only recreate generator when crossing length thresholds
            self.id_generator = IdGenerator::new(IdGeneratorConfig {
                prefix: self.prefix.clone(),
                board_size: current_size,
            });

            // Re-register all existing IDs (O(n), but only at thresholds)
            for id in self.initiatives.keys() {
                self.id_generator.register_id(id.as_str().to_string());
            }
        }
    }

    /// Generate a new unique ID for an initiative
    pub(super) fn generate_id(&mut self, new_initiative: &NewInitiative) -> Result<InitiativeId> {
        // Update generator config if we've crossed a length threshold
        self.update_id_generator_if_needed();

        let id_str = self
            .id_generator
            .generate(
                &new_initiative.title,
                &new_initiative.description,
                new_initiative.team.as_ref().map(|team| team.0.as_str()),
            )
            .map_err(|e| Error::Storage(format!("ID generation failed: {}", e)))?;

        Ok(InitiativeId::new(id_str))
    }
}
