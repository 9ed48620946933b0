// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Position and page-range resolution.
//
// Coordinates are PDF user-space points with the origin at the bottom-left of
// the page. Page ranges are 1-indexed, the way users count pages.

use std::collections::BTreeSet;

use crate::error::{Result, StampwerkError};
use crate::types::{Point, Rect, Rgb};

/// Parse an `x,y` anchor point.
pub fn parse_point(s: &str) -> Result<Point> {
    let values = numeric_tokens(s, 2)?;
    Ok(Point {
        x: values[0],
        y: values[1],
    })
}

/// Parse an `x1,y1,x2,y2` bounding box.
///
/// The box must be non-degenerate: `x2 > x1` and `y2 > y1`.
pub fn parse_box(s: &str) -> Result<Rect> {
    let values = numeric_tokens(s, 4)?;
    Rect::new(values[0], values[1], values[2], values[3])
}

/// Resolve a page-range expression such as `1,3,5-7` against a document with
/// `total_pages` pages.
///
/// Out-of-bounds pages are dropped rather than rejected so that `1-1000` works
/// on a 10-page document. Reversed ranges (`5-3`) yield nothing. The result is
/// strictly ascending with no duplicates.
pub fn parse_page_range(spec: &str, total_pages: u32) -> Vec<u32> {
    let mut pages = BTreeSet::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = token.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
            else {
                continue;
            };
            let end = end.min(total_pages);
            for page in start.max(1)..=end {
                pages.insert(page);
            }
        } else if let Ok(page) = token.parse::<u32>()
            && (1..=total_pages).contains(&page)
        {
            pages.insert(page);
        }
    }

    pages.into_iter().collect()
}

/// Parse a colour given as `#rrggbb` hex or as `r,g,b` components.
///
/// Components above 1.0 are treated as 0–255 values.
pub fn parse_color(s: &str) -> Result<Rgb> {
    let trimmed = s.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StampwerkError::InvalidArgument(format!(
                "colour '{s}' must look like #rrggbb"
            )));
        }
        let channel = |i: usize| -> Result<f32> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|e| StampwerkError::InvalidArgument(format!("colour '{s}': {e}")))
        };
        return Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
    }

    let values = numeric_tokens(trimmed, 3)
        .map_err(|_| StampwerkError::InvalidArgument(format!("colour '{s}' must be #rrggbb or r,g,b")))?;
    let scale = if values.iter().any(|v| *v > 1.0) { 255.0 } else { 1.0 };
    Ok(Rgb::new(values[0] / scale, values[1] / scale, values[2] / scale))
}

/// Split on commas and parse exactly `expected` numbers.
fn numeric_tokens(s: &str, expected: usize) -> Result<Vec<f32>> {
    let tokens: Vec<&str> = s.split(',').map(str::trim).collect();
    if tokens.len() != expected {
        return Err(StampwerkError::MalformedGeometry(format!(
            "'{s}' has {} value(s), expected {expected}",
            tokens.len()
        )));
    }

    tokens
        .iter()
        .map(|token| {
            token
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    StampwerkError::MalformedGeometry(format!("'{token}' in '{s}' is not a number"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_requires_four_values() {
        assert!(matches!(
            parse_box("400,700,500"),
            Err(StampwerkError::MalformedGeometry(_))
        ));
        let rect = parse_box("400,700,500,750").unwrap();
        assert_eq!(
            (rect.x1, rect.y1, rect.x2, rect.y2),
            (400.0, 700.0, 500.0, 750.0)
        );
    }

    #[test]
    fn box_rejects_inverted_corners() {
        assert!(matches!(
            parse_box("500,700,400,750"),
            Err(StampwerkError::MalformedGeometry(_))
        ));
    }

    #[test]
    fn point_requires_two_numbers() {
        assert_eq!(parse_point(" 450 , 50 ").unwrap(), Point { x: 450.0, y: 50.0 });
        assert!(parse_point("450").is_err());
        assert!(parse_point("450,abc").is_err());
        assert!(parse_point("1,2,3").is_err());
    }

    #[test]
    fn reversed_range_yields_nothing() {
        assert_eq!(parse_page_range("5-3,2", 10), vec![2]);
    }

    #[test]
    fn range_is_clipped_to_document() {
        assert_eq!(parse_page_range("1,3,5-7,100", 6), vec![1, 3, 5, 6]);
        assert_eq!(parse_page_range("1-1000", 3), vec![1, 2, 3]);
    }

    #[test]
    fn range_output_is_sorted_and_deduplicated() {
        assert_eq!(parse_page_range("4,1-3,2,4,0", 5), vec![1, 2, 3, 4]);
        assert!(parse_page_range("", 5).is_empty());
        assert!(parse_page_range("x,2-y", 5).is_empty());
    }

    #[test]
    fn colours_parse_from_hex_and_components() {
        assert_eq!(parse_color("#ff0000").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(parse_color("0,0.5,1").unwrap(), Rgb::new(0.0, 0.5, 1.0));
        assert_eq!(parse_color("255,0,0").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert!(parse_color("#ff00").is_err());
        assert!(parse_color("red").is_err());
    }
}
