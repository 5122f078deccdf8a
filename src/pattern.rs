//! Derivation of mask array paths from source array paths.
use std::fmt;

use crate::{Error, Result};

const SLOT: &str = "{}";

/// Default pattern, placing masks next to a `/volumes/labels` style hierarchy.
pub const DEFAULT_MASK_PATTERN: &str = "/volumes/masks/{}";

/// A path template with exactly one `{}` slot.
///
/// The slot is filled with the last segment of a source array path,
/// e.g. `/volumes/masks/{}` maps `/volumes/labels/neuron_ids` to `/volumes/masks/neuron_ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPattern {
    template: String,
    prefix: String,
    suffix: String,
}

impl MaskPattern {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let invalid = |reason: &str| Error::InvalidPattern {
            pattern: template.clone(),
            reason: reason.into(),
        };

        let Some((prefix, suffix)) = template.split_once(SLOT) else {
            return Err(invalid("no `{}` substitution slot"));
        };
        if suffix.contains(SLOT) {
            return Err(invalid("more than one `{}` substitution slot"));
        }
        if [prefix, suffix]
            .iter()
            .any(|s| s.contains('{') || s.contains('}'))
        {
            return Err(invalid("unmatched brace outside the substitution slot"));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            template,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill the slot with the last segment of `source_path`.
    ///
    /// The result is not normalised; see [normalise_path].
    pub fn derive(&self, source_path: &str) -> String {
        let segment = last_segment(source_path);
        format!("{}{segment}{}", self.prefix, self.suffix)
    }
}

impl Default for MaskPattern {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_PATTERN).expect("default pattern should be valid")
    }
}

impl fmt::Display for MaskPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl std::str::FromStr for MaskPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// The text after the final `/`, or the whole path if there is none.
pub fn last_segment(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, segment)) => segment,
        None => path,
    }
}

/// Add a leading `/` and strip trailing `/`s, leaving the root as `/`.
pub fn normalise_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
