// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding raster images into a form that can be embedded in a PDF.

pub mod processor;

pub use processor::{EmbeddableImage, ImageProcessor};
