// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// stampwerk-security — Screening of untrusted input files.
//
// Every document that is extracted from passes through the safety validator
// first; batch modification may opt in. Integrity hashes fingerprint inputs in
// validation reports and logs.

pub mod integrity;
pub mod validator;

pub use integrity::{hash_bytes, verify_hash};
pub use validator::{FileSafetyValidator, IssueSeverity, SafetyIssue, SafetyReport};
