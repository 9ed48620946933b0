// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity — SHA-256 fingerprints of input and output files.

use sha2::{Digest, Sha256};
use stampwerk_core::error::StampwerkError;

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches the expected SHA-256 hex digest.
///
/// Comparison is case-insensitive on the expected digest.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), StampwerkError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(StampwerkError::UnsafeFile(format!(
            "checksum mismatch: expected {expected_hex}, got {actual}"
        )))
    }
}
