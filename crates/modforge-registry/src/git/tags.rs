//! Mapping between git tags and release versions

use modforge_core::error::ForgeError;
use regex::Regex;
use std::collections::HashSet;

use crate::RegistryResult;

/// Default release tag pattern: `1.2.3` or `v1.2.3`
pub const DEFAULT_TAG_PATTERN: &str = r"^v?(?P<version>\d+\.\d+\.\d+)$";

/// Decides which tags are releases and what version each one names
///
/// The version is the `version` named group when the pattern has one,
/// otherwise the first capture group, otherwise the whole tag.
#[derive(Debug, Clone)]
pub struct TagPattern {
    regex: Regex,
}

impl TagPattern {
    pub fn new(pattern: &str) -> RegistryResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| ForgeError::ConfigValidation {
            field: "tag_pattern".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Version named by `tag`, or `None` when the tag is not a release
    pub fn version_of(&self, tag: &str) -> Option<String> {
        let captures = self.regex.captures(tag)?;
        let version = captures
            .name("version")
            .or_else(|| captures.get(1))
            .or_else(|| captures.get(0))?;
        Some(version.as_str().to_string())
    }

    /// Release tags with their versions, in the given order
    ///
    /// When several tags name the same version (`1.0.0` and `v1.0.0` under
    /// the default pattern) only the first of them is a release.
    pub fn releases<'a>(&self, tags: &'a [String]) -> Vec<(&'a str, String)> {
        let mut seen = HashSet::new();
        tags.iter()
            .filter_map(|tag| self.version_of(tag).map(|version| (tag.as_str(), version)))
            .filter(|(_, version)| seen.insert(version.clone()))
            .collect()
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_TAG_PATTERN).unwrap_or_else(|_| unreachable!("default tag pattern compiles")),
        }
    }
}
