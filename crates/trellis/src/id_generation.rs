//! Hash-based ID generation for initiatives.
//!
//! Creates collision-resistant initiative IDs using SHA256 and base36
//! encoding, with an adaptive length that grows with board size.
//!
//! # Format
//!
//! `{prefix}-{hash}` (e.g., "plan-a3f8")
//!
//! # Example
//!
//! ```
//! use trellis::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let config = IdGeneratorConfig {
//!     prefix: "plan".to_string(),
//!     board_size: 100,
//! };
//!
//! let mut generator = IdGenerator::new(config);
//!
//! let id = generator.generate(
//!     "Checkout revamp",
//!     "Rework the checkout funnel",
//!     Some("payments"),
//! ).unwrap();
//!
//! println!("Generated ID: {}", id); // e.g., "plan-a3f8"
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces and length increases
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried before giving up
        attempts: u32,
    },

    /// Base36 encoding failed
    #[error("Base36 encoding failed: {0}")]
    EncodingFailed(String),

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all IDs (e.g., "plan")
    pub prefix: String,

    /// Current number of initiatives on the board (affects adaptive length)
    pub board_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// The generator tracks every ID it has seen in `existing_ids` to prevent
/// collisions; load existing IDs once via [`IdGenerator::register_id`] and
/// recreate the generator when crossing board-size thresholds.
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    #[must_use]
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: String) {
        self.existing_ids.insert(id);
    }

    /// The board size this generator was configured with
    #[must_use]
    pub fn board_size(&self) -> usize {
        self.config.board_size
    }

    /// Generate a new unique ID
    ///
    /// # Arguments
    ///
    /// * `title` - Initiative title
    /// * `description` - Initiative description
    /// * `team` - Optional owning team
    ///
    /// # Errors
    ///
    /// Returns an error if unable to generate a unique ID after trying all
    /// nonces at the maximum length.
    pub fn generate(
        &mut self,
        title: &str,
        description: &str,
        team: Option<&str>,
    ) -> Result<String, IdGenerationError> {
        let id_length = self.adaptive_length();

        // Try generating with different nonces
        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(title, description, team, nonce, id_length)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(
                        nonce,
                        id_length, "Generated unique ID after {} collision retries", nonce
                    );
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        // If all nonces collide, try with increased length
        if id_length < 6 {
            warn!(
                id_length,
                max_nonce = MAX_NONCE,
                "All nonces exhausted, increasing ID length to {}",
                id_length + 1
            );
            let longer_id = self.generate_hash_id(title, description, team, 0, id_length + 1)?;
            self.existing_ids.insert(longer_id.clone());
            return Ok(longer_id);
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    /// Generate a hash-based ID with the given parameters
    fn generate_hash_id(
        &self,
        title: &str,
        description: &str,
        team: Option<&str>,
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        // Combine inputs for hashing
        let timestamp = Utc::now().timestamp();
        let content = format!(
            "{}|{}|{}|{}|{}",
            title,
            description,
            team.unwrap_or(""),
            timestamp,
            nonce
        );

        // SHA256 hash
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        // Base36 encode to desired length
        let hash_str = encode_base36(&hash_bytes[..8], length)?;

        // Format: {prefix}-{hash}
        Ok(format!("{}-{}", self.config.prefix, hash_str))
    }

    /// Determine ID length based on board size
    ///
    /// - 0-500 initiatives: 4 chars
    /// - 500-1,500: 5 chars
    /// - 1,500+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.config.board_size {
            0..=500 => 4,
            501..=1500 => 5,
            _ => 6,
        }
    }
}

/// Encode bytes as base36 string
///
/// The input is limited to the first 8 bytes of the SHA256 hash so the
/// intermediate value fits a u64; wrapping arithmetic keeps the conversion
/// deterministic and the encoding step normalizes to the requested length.
///
/// # Errors
///
/// Returns an error if length is 0 or if UTF-8 conversion fails.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    // Convert bytes to a large number (limited to 8 bytes by caller)
    let mut num: u64 = 0;
    for &byte in bytes {
        num = num.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    // Convert to base36
    let mut result = Vec::new();
    let mut n = num;

    while result.len() < length {
        let remainder = (n % 36) as usize;
        result.push(BASE36_CHARS[remainder]);
        n /= 36;
    }

    result.reverse();

    String::from_utf8(result)
        .map_err(|e| IdGenerationError::EncodingFailed(format!("UTF-8 conversion failed: {}", e)))
}

/// Validate ID format: `{prefix}-{hash}` with a 4-6 char alphanumeric hash
/// (e.g., "plan-a3f8").
#[must_use]
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id.strip_prefix(&format!("{}-", prefix)) else {
        return false;
    };

    if hash.len() < 4 || hash.len() > 6 {
        return false;
    }

    hash.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base36_encoding() {
        let bytes = &[0x12, 0x34, 0x56, 0x78];
        let result = encode_base36(bytes, 4).unwrap();
        assert_eq!(result.len(), 4);
        assert!(result.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_base36_zero_length_rejected() {
        let bytes = &[0x12, 0x34];
        assert!(matches!(
            encode_base36(bytes, 0),
            Err(IdGenerationError::InvalidLength)
        ));
    }

    #[test]
    fn test_adaptive_length() {
        let small = IdGenerator::new(IdGeneratorConfig {
            prefix: "plan".to_string(),
            board_size: 10,
        });
        assert_eq!(small.adaptive_length(), 4);

        let medium = IdGenerator::new(IdGeneratorConfig {
            prefix: "plan".to_string(),
            board_size: 1000,
        });
        assert_eq!(medium.adaptive_length(), 5);

        let large = IdGenerator::new(IdGeneratorConfig {
            prefix: "plan".to_string(),
            board_size: 5000,
        });
        assert_eq!(large.adaptive_length(), 6);
    }

    #[test]
    fn test_generated_id_has_prefix_and_is_unique() {
        let mut generator = IdGenerator::new(IdGeneratorConfig {
            prefix: "plan".to_string(),
            board_size: 0,
        });

        let first = generator
            .generate("Checkout revamp", "Rework the funnel", None)
            .unwrap();
        let second = generator
            .generate("Checkout revamp", "Rework the funnel", None)
            .unwrap();

        assert!(first.starts_with("plan-"));
        assert!(validate_id(&first, "plan"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_registered_id_is_never_reissued() {
        let mut generator = IdGenerator::new(IdGeneratorConfig {
            prefix: "plan".to_string(),
            board_size: 0,
        });
        generator.register_id("plan-a3f8".to_string());

        let id = generator.generate("Title", "Description", Some("web")).unwrap();
        assert_ne!(id, "plan-a3f8");
    }

    #[test]
    fn test_validate_id_rejects_foreign_formats() {
        assert!(!validate_id("other-a3f8", "plan"));
        assert!(!validate_id("plan-", "plan"));
        assert!(!validate_id("plan-ab", "plan"));
        assert!(!validate_id("plan-abcdefgh", "plan"));
        assert!(!validate_id("plan-a3!8", "plan"));
        assert!(validate_id("plan-a3f8", "plan"));
    }
}
