// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File safety validator — cheap screening of a PDF before any parser sees it.
//
// Checks size, extension, header and trailer markers, and scans the raw bytes
// for actions that launch programs or run scripts. This is not a malware
// scanner; it keeps obviously wrong or hostile inputs away from the parser.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::integrity::{hash_bytes, verify_hash};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueSeverity {
    /// Worth reporting; the file may still be processed.
    Warning,
    /// The file must not be opened.
    Blocking,
}

/// One finding from the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

impl SafetyIssue {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    fn blocking(message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Blocking,
            message: message.into(),
        }
    }
}

/// Result of screening one file.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyReport {
    /// `true` when no blocking issue was found.
    pub safe: bool,
    pub issues: Vec<SafetyIssue>,
    /// SHA-256 of the file contents, when it could be read.
    pub sha256: Option<String>,
    pub size_bytes: u64,
}

impl SafetyReport {
    fn from_issues(issues: Vec<SafetyIssue>, sha256: Option<String>, size_bytes: u64) -> Self {
        let safe = !issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Blocking);
        Self {
            safe,
            issues,
            sha256,
            size_bytes,
        }
    }

    /// Issue messages joined for logs and error strings.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Name tokens that make a PDF launch something or run code when opened.
const BLOCKING_MARKERS: &[&[u8]] = &[b"/Launch"];
const WARNING_MARKERS: &[&[u8]] = &[b"/JavaScript", b"/JS", b"/EmbeddedFile", b"/OpenAction"];

/// Screens input files before they are parsed.
#[derive(Debug, Clone)]
pub struct FileSafetyValidator {
    max_size_bytes: u64,
    expected_sha256: Option<String>,
}

impl FileSafetyValidator {
    pub fn new(max_size_bytes: u64) -> Self {
        Self {
            max_size_bytes,
            expected_sha256: None,
        }
    }

    /// Also require the file to match a known SHA-256 digest.
    pub fn with_expected_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into());
        self
    }

    /// Screen the file at `path`.
    ///
    /// Never fails: unreadable files produce a report with a blocking issue.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn validate(&self, path: impl AsRef<Path>) -> SafetyReport {
        let path = path.as_ref();
        let mut issues = Vec::new();

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            issues.push(SafetyIssue::blocking("file does not have a .pdf extension"));
        }

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                issues.push(SafetyIssue::blocking(format!("cannot stat file: {err}")));
                return SafetyReport::from_issues(issues, None, 0);
            }
        };
        if !metadata.is_file() {
            issues.push(SafetyIssue::blocking("not a regular file"));
            return SafetyReport::from_issues(issues, None, 0);
        }

        let size = metadata.len();
        if size > self.max_size_bytes {
            issues.push(SafetyIssue::blocking(format!(
                "file is {size} bytes, limit is {}",
                self.max_size_bytes
            )));
            return SafetyReport::from_issues(issues, None, size);
        }

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                issues.push(SafetyIssue::blocking(format!("cannot read file: {err}")));
                return SafetyReport::from_issues(issues, None, size);
            }
        };

        issues.extend(self.screen_bytes(&data));
        let sha256 = hash_bytes(&data);

        if let Some(expected) = &self.expected_sha256
            && let Err(err) = verify_hash(&data, expected)
        {
            issues.push(SafetyIssue::blocking(err.to_string()));
        }

        let report = SafetyReport::from_issues(issues, Some(sha256), size);
        if report.safe {
            debug!(issues = report.issues.len(), "file passed safety checks");
        } else {
            warn!(summary = %report.summary(), "file failed safety checks");
        }
        report
    }

    /// Content checks on an in-memory file.
    fn screen_bytes(&self, data: &[u8]) -> Vec<SafetyIssue> {
        let mut issues = Vec::new();

        if data.is_empty() {
            issues.push(SafetyIssue::blocking("file is empty"));
            return issues;
        }

        // The header may be preceded by a little junk; readers tolerate 1 KiB.
        let head = &data[..data.len().min(1024)];
        if find(head, b"%PDF-").is_none() {
            issues.push(SafetyIssue::blocking("missing %PDF- header"));
        }

        let tail = &data[data.len().saturating_sub(1024)..];
        if find(tail, b"%%EOF").is_none() {
            issues.push(SafetyIssue::warning("missing %%EOF marker (file may be truncated)"));
        }

        for marker in BLOCKING_MARKERS {
            if find(data, marker).is_some() {
                issues.push(SafetyIssue::blocking(format!(
                    "contains {} action",
                    String::from_utf8_lossy(marker)
                )));
            }
        }
        for marker in WARNING_MARKERS {
            if find(data, marker).is_some() {
                issues.push(SafetyIssue::warning(format!(
                    "contains {}",
                    String::from_utf8_lossy(marker)
                )));
            }
        }

        issues
    }
}

impl Default for FileSafetyValidator {
    fn default() -> Self {
        Self::new(200 * 1024 * 1024)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents)
            .unwrap();
        (dir, path)
    }

    #[test]
    fn plain_pdf_is_safe() {
        let (_dir, path) = write_temp("ok.pdf", b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF\n");
        let report = FileSafetyValidator::default().validate(&path);
        assert!(report.safe, "{}", report.summary());
        assert!(report.issues.is_empty());
        assert_eq!(report.sha256.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn wrong_extension_is_blocking() {
        let (_dir, path) = write_temp("doc.txt", b"%PDF-1.7\n%%EOF");
        assert!(!FileSafetyValidator::default().validate(&path).safe);
    }

    #[test]
    fn missing_file_is_blocking() {
        let report = FileSafetyValidator::default().validate("/nonexistent/missing.pdf");
        assert!(!report.safe);
        assert!(report.sha256.is_none());
    }

    #[test]
    fn launch_action_is_blocking_but_javascript_warns() {
        let (_dir, path) = write_temp("launch.pdf", b"%PDF-1.4\n<< /S /Launch >>\n%%EOF");
        assert!(!FileSafetyValidator::default().validate(&path).safe);

        let (_dir, path) = write_temp("script.pdf", b"%PDF-1.4\n<< /S /JavaScript >>\n%%EOF");
        let report = FileSafetyValidator::default().validate(&path);
        assert!(report.safe);
        assert_eq!(report.issues[0].severity, IssueSeverity::Warning);
    }

    #[test]
    fn size_limit_is_enforced() {
        let (_dir, path) = write_temp("big.pdf", b"%PDF-1.4\n0123456789\n%%EOF");
        let report = FileSafetyValidator::new(8).validate(&path);
        assert!(!report.safe);
        assert!(report.summary().contains("limit"));
    }

    #[test]
    fn checksum_mismatch_is_blocking() {
        let (_dir, path) = write_temp("sum.pdf", b"%PDF-1.4\n%%EOF");
        let report = FileSafetyValidator::default()
            .with_expected_sha256("00")
            .validate(&path);
        assert!(!report.safe);
    }
}
