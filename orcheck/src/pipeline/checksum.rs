//! Input snapshot checksum.

use sha2::{Digest, Sha256};

use super::config::CheckConfig;

/// SHA-256 over the OR list text and the configuration that affects results,
/// hex encoded.
///
/// `[run]` settings only change how the work is scheduled and are left out.
pub fn snapshot_checksum(content: &str, config: &CheckConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([0u8]);
    let effective = CheckConfig {
        run: Default::default(),
        ..config.clone()
    };
    // struct fields serialize in declaration order
    if let Ok(config_json) = serde_json::to_vec(&effective) {
        hasher.update(&config_json);
    }
    hex::encode(hasher.finalize())
}
