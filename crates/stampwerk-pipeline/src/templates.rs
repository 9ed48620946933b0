// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in edit templates.
//
// A template is a pure function of the current time. It is evaluated once per
// invocation so every file in a batch carries the same date.

use chrono::NaiveDateTime;
use stampwerk_core::error::{Result, StampwerkError};
use stampwerk_core::types::{
    EditSet, PageTarget, Point, Rect, Rgb, SignatureEdit, SignatureSource, TextEdit,
};

/// Name and one-line description of a built-in template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: &'static str,
    pub description: &'static str,
}

const TEMPLATES: &[TemplateInfo] = &[
    TemplateInfo {
        name: "approval-stamp",
        description: "Green APPROVED stamp with the approval date, bottom right of page 1",
    },
    TemplateInfo {
        name: "confidential-watermark",
        description: "Large diagonal light-gray CONFIDENTIAL across every page",
    },
    TemplateInfo {
        name: "signature-bottom-right",
        description: "Typed signature with a signing line in the bottom-right corner of page 1",
    },
    TemplateInfo {
        name: "review-stamp",
        description: "Blue REVIEWED stamp with date and time, bottom left of page 1",
    },
];

const STAMP_GREEN: Rgb = Rgb {
    r: 0.0,
    g: 0.5,
    b: 0.0,
};
const REVIEW_BLUE: Rgb = Rgb {
    r: 0.0,
    g: 0.2,
    b: 0.6,
};
const WATERMARK_GRAY: Rgb = Rgb {
    r: 0.85,
    g: 0.85,
    b: 0.85,
};

/// The fixed catalog of templates.
pub struct TemplateCatalog;

impl TemplateCatalog {
    pub fn list() -> &'static [TemplateInfo] {
        TEMPLATES
    }

    /// Build the edits of template `name` as of `now`.
    pub fn resolve(name: &str, now: NaiveDateTime) -> Result<EditSet> {
        let edits = match name {
            "approval-stamp" => text_only(vec![
                TextEdit {
                    font_size: Some(24.0),
                    color: Some(STAMP_GREEN),
                    font: Some("Helvetica-Bold".into()),
                    ..TextEdit::new("APPROVED", Point { x: 450.0, y: 50.0 })
                },
                TextEdit {
                    font_size: Some(10.0),
                    color: Some(STAMP_GREEN),
                    ..TextEdit::new(
                        format!("Approved: {}", now.format("%Y-%m-%d")),
                        Point { x: 450.0, y: 30.0 },
                    )
                },
            ]),
            // Centred on an A4 page once rotated by 45 degrees.
            "confidential-watermark" => text_only(vec![TextEdit {
                page: PageTarget::AllPages,
                font_size: Some(72.0),
                color: Some(WATERMARK_GRAY),
                font: Some("Helvetica-Bold".into()),
                rotation: Some(45.0),
                ..TextEdit::new("CONFIDENTIAL", Point { x: 145.0, y: 270.0 })
            }]),
            "signature-bottom-right" => EditSet::new(
                Vec::new(),
                vec![SignatureEdit {
                    rect: Rect::new(400.0, 50.0, 550.0, 100.0)?,
                    source: SignatureSource::Text("Authorized Signature".into()),
                    page: PageTarget::default(),
                }],
                Vec::new(),
                Vec::new(),
            ),
            "review-stamp" => text_only(vec![
                TextEdit {
                    font_size: Some(18.0),
                    color: Some(REVIEW_BLUE),
                    font: Some("Helvetica-Bold".into()),
                    ..TextEdit::new("REVIEWED", Point { x: 50.0, y: 50.0 })
                },
                TextEdit {
                    font_size: Some(9.0),
                    color: Some(REVIEW_BLUE),
                    ..TextEdit::new(
                        format!("Reviewed: {}", now.format("%Y-%m-%d %H:%M")),
                        Point { x: 50.0, y: 35.0 },
                    )
                },
            ]),
            other => return Err(StampwerkError::TemplateNotFound(other.to_string())),
        };
        Ok(edits)
    }
}

fn text_only(text: Vec<TextEdit>) -> EditSet {
    EditSet::new(text, Vec::new(), Vec::new(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|date| date.and_hms_opt(12, 5, 0))
            .unwrap()
    }

    #[test]
    fn every_listed_template_resolves() {
        for template in TemplateCatalog::list() {
            let edits = TemplateCatalog::resolve(template.name, noon()).unwrap();
            assert!(!edits.is_empty(), "{} is empty", template.name);
        }
    }

    #[test]
    fn approval_stamp_is_dated() {
        let edits = TemplateCatalog::resolve("approval-stamp", noon()).unwrap();
        let texts: Vec<&str> = edits.text().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["APPROVED", "Approved: 2026-03-14"]);
        assert_eq!(edits.text()[0].page, PageTarget::Index(0));
    }

    #[test]
    fn review_stamp_carries_time() {
        let edits = TemplateCatalog::resolve("review-stamp", noon()).unwrap();
        assert_eq!(edits.text().len(), 2);
        assert_eq!(edits.text()[1].text, "Reviewed: 2026-03-14 12:05");
    }

    #[test]
    fn watermark_targets_all_pages() {
        let edits = TemplateCatalog::resolve("confidential-watermark", noon()).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits.text()[0].page, PageTarget::AllPages);
        assert_eq!(edits.text()[0].rotation, Some(45.0));
    }

    #[test]
    fn signature_template_uses_fixed_box() {
        let edits = TemplateCatalog::resolve("signature-bottom-right", noon()).unwrap();
        let signature = &edits.signatures()[0];
        assert_eq!(<[f32; 4]>::from(signature.rect), [400.0, 50.0, 550.0, 100.0]);
        assert!(matches!(signature.source, SignatureSource::Text(_)));
    }

    #[test]
    fn unknown_names_are_soft_errors() {
        let err = TemplateCatalog::resolve("approval", noon()).unwrap_err();
        assert!(matches!(err, StampwerkError::TemplateNotFound(_)));
        assert!(err.is_soft());
    }
}
