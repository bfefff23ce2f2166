//! Description merge policy.
//!
//! One pure function combines an existing description with newly generated
//! text. The same function runs at draft time, at promotion time, and for any
//! canonical-field update so the three paths cannot drift apart.
use crate::error::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clause prefixed to model output and used as the `Append` truncation
/// marker, so repeated merges keep exactly one generated tail.
pub const AI_DISCLAIMER: &str = "[Draft description generated by AI]\n";

/// How new text folds into an existing description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriptionHandling {
    Append,
    Prepend,
    Replace,
}

impl DescriptionHandling {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptionHandling::Append => "APPEND",
            DescriptionHandling::Prepend => "PREPEND",
            DescriptionHandling::Replace => "REPLACE",
        }
    }
}

impl fmt::Display for DescriptionHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DescriptionHandling {
    type Err = ScribeError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "APPEND" => Ok(DescriptionHandling::Append),
            "PREPEND" => Ok(DescriptionHandling::Prepend),
            "REPLACE" => Ok(DescriptionHandling::Replace),
            other => Err(ScribeError::validation(format!(
                "unknown description handling {other:?}, expected APPEND, PREPEND, or REPLACE"
            ))),
        }
    }
}

/// Combine `old` and `new` description text under `handling`.
///
/// Empty `new` always returns `old` unchanged. `Append` truncates `old` at
/// the first disclaimer marker before appending, so a re-generated tail
/// replaces the previous one instead of stacking.
pub fn combine(old: &str, new: &str, handling: DescriptionHandling) -> String {
    if new.is_empty() {
        return old.to_string();
    }
    match handling {
        DescriptionHandling::Append => {
            if old.is_empty() {
                new.to_string()
            } else if let Some(index) = old.find(AI_DISCLAIMER) {
                format!("{}{new}", &old[..index])
            } else {
                format!("{old}{new}")
            }
        }
        DescriptionHandling::Prepend => format!("{new}{old}"),
        DescriptionHandling::Replace => new.to_string(),
    }
}

/// Prefix generated text with the disclaimer clause.
pub fn with_disclaimer(text: &str) -> String {
    format!("{AI_DISCLAIMER}{text}")
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
