//! Module manifest parsing
//!
//! A release's manifest is either a `metadata.json` document or a legacy
//! `Modulefile`. Both parse into a `Release`.

mod json;
mod modulefile;

pub use json::parse_metadata_json;
pub use modulefile::parse_modulefile;

use modforge_core::types::IdentityError;
use thiserror::Error;

/// Manifest file names in lookup order
pub const MANIFEST_FILES: [&str; 2] = ["metadata.json", "Modulefile"];

/// Why a manifest could not be turned into a release
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid metadata.json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Modulefile line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("missing '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    InvalidName(#[from] IdentityError),
}

/// Parse a manifest by file name
pub fn parse_manifest(
    file_name: &str,
    content: &[u8],
) -> Result<modforge_core::types::Release, ManifestError> {
    if file_name == "Modulefile" {
        parse_modulefile(&String::from_utf8_lossy(content))
    } else {
        parse_metadata_json(content)
    }
}
