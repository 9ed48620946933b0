// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stampwerk", version)]
#[command(about = "Stamp, sign, fill, and extract PDFs, one at a time or a directory at once.")]
pub(crate) struct Cli {
    /// Settings file (JSON). Falls back to $STAMPWERK_CONFIG, then defaults.
    #[arg(long, global = true)]
    pub(crate) settings: Option<PathBuf>,

    /// Log debug detail to stderr. RUST_LOG overrides.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Apply edits to one PDF.
    Modify {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        edits: EditArgs,
    },
    /// Apply the same edits to every matching PDF in a directory.
    BatchModify {
        input_dir: PathBuf,
        output_dir: PathBuf,

        /// File-name glob (default from settings, normally *.pdf)
        #[arg(long)]
        pattern: Option<String>,

        /// List the files and edits without changing anything
        #[arg(long)]
        preview_only: bool,

        /// Process all files concurrently
        #[arg(long)]
        parallel: bool,

        /// Screen every input with the file safety validator first
        #[arg(long)]
        validate: bool,

        #[command(flatten)]
        edits: EditArgs,
    },
    /// Extract text from a PDF.
    Extract {
        input: PathBuf,

        /// Write the text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 1-based pages to extract, e.g. 1,3-5
        #[arg(long)]
        pages: Option<String>,

        /// Password for an encrypted document
        #[arg(long)]
        password: Option<String>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Print pages, page count, and metadata as JSON
        #[arg(long)]
        json: bool,

        /// Refuse the file unless its SHA-256 digest matches (hex)
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },
    /// Convert a source document (Markdown, Typst, LaTeX, text, image) to PDF.
    Generate {
        input: PathBuf,
        output: PathBuf,

        /// pandoc, typst, latex, or builtin (default: chosen by extension)
        #[arg(long)]
        engine: Option<String>,

        /// Document title for builtin rendering
        #[arg(long)]
        title: Option<String>,
    },
    /// List the built-in templates, or the available engines.
    Templates {
        /// Also report which generation engines are installed
        #[arg(long)]
        engines: bool,
    },
}

/// Edit flags shared by `modify` and `batch-modify`.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct EditArgs {
    /// Text to insert
    #[arg(long, value_name = "TEXT")]
    pub(crate) add_text: Option<String>,

    /// Anchor of the inserted text, x,y in points from the bottom-left
    #[arg(long, value_name = "X,Y", default_value = "72,72")]
    pub(crate) position: String,

    /// 0-based page for the ad-hoc text, signature, and image
    #[arg(long, value_name = "N")]
    pub(crate) page_index: Option<u32>,

    /// 1-based page range for the ad-hoc edits, e.g. 1,3-5
    #[arg(long, value_name = "RANGE", conflicts_with = "page_index")]
    pub(crate) pages: Option<String>,

    /// Put every text edit on every page
    #[arg(long)]
    pub(crate) all_pages: bool,

    #[arg(long, value_name = "PT")]
    pub(crate) font_size: Option<f32>,

    /// #rrggbb or r,g,b
    #[arg(long)]
    pub(crate) color: Option<String>,

    /// One of the 14 standard PDF fonts, e.g. Helvetica-Bold
    #[arg(long)]
    pub(crate) font: Option<String>,

    /// Counter-clockwise rotation of the inserted text, in degrees
    #[arg(long, value_name = "DEG")]
    pub(crate) rotation: Option<f32>,

    /// Signature image (PNG or JPEG)
    #[arg(long, value_name = "PATH", conflicts_with = "add_signature_text")]
    pub(crate) add_signature_image: Option<PathBuf>,

    /// Typed signature name
    #[arg(long, value_name = "NAME")]
    pub(crate) add_signature_text: Option<String>,

    /// Signature box, x1,y1,x2,y2
    #[arg(long, value_name = "BOX", default_value = "400,50,550,100")]
    pub(crate) signature_box: String,

    /// Fill a form field; repeatable
    #[arg(long, value_name = "NAME=VALUE")]
    pub(crate) fill_field: Vec<String>,

    /// Image to place
    #[arg(long, value_name = "PATH", requires = "image_box")]
    pub(crate) add_image: Option<PathBuf>,

    /// Image box, x1,y1,x2,y2
    #[arg(long, value_name = "BOX")]
    pub(crate) image_box: Option<String>,

    /// Built-in template to apply (see `stampwerk templates`)
    #[arg(long)]
    pub(crate) template: Option<String>,

    /// JSON file of edits
    #[arg(long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
}
