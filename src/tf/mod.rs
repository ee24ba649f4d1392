//! Terraform output layer
//!
//! Generators build a [`Document`] of [`Block`] records instead of splicing
//! strings; the fetch and resolution layers never see formatting. Two
//! renderers share the IR:
//!
//! - [`hcl`] - native HCL, the default
//! - [`json`] - Terraform JSON syntax
//!
//! Import blocks use the Terraform 1.5+ `import {}` form.

pub mod hcl;
pub mod ir;
pub mod json;

pub use ir::{Block, Document, TfValue};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output syntax selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Hcl,
    Json,
}

impl Document {
    /// Render the document in the requested syntax
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Hcl => hcl::render(self),
            OutputFormat::Json => json::render(self),
        }
    }
}
