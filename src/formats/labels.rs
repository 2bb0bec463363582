//! Problem label schemes
//!
//! Contests may override how their problems are labelled on the scoreboard.
//! The scheme is stored as JSON on the contest, e.g.
//! `{"type": "alphabetic"}` or `{"type": "custom", "labels": ["P1", "P2"]}`.

use serde::{Deserialize, Serialize};

use super::FormatError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProblemLabelScheme {
    /// 1, 2, 3, ...
    Numeric,
    /// A, B, ..., Z, AA, AB, ...
    Alphabetic,
    /// Explicit labels; problems past the end of the list are numbered
    Custom { labels: Vec<String> },
}

impl ProblemLabelScheme {
    /// Parse the scheme stored on a contest. A missing value means the
    /// format's own labels are used.
    pub fn from_config(config: Option<&serde_json::Value>) -> Result<Option<Self>, FormatError> {
        let config = match config {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(config) => config,
        };

        let scheme: Self = serde_json::from_value(config.clone())
            .map_err(|e| FormatError::InvalidLabels(e.to_string()))?;

        if let Self::Custom { labels } = &scheme {
            if labels.is_empty() {
                return Err(FormatError::InvalidLabels(
                    "custom scheme needs at least one label".to_string(),
                ));
            }
            if labels.iter().any(|l| l.trim().is_empty()) {
                return Err(FormatError::InvalidLabels(
                    "labels must not be blank".to_string(),
                ));
            }
        }

        Ok(Some(scheme))
    }

    /// Label of the problem at zero-based `index`
    pub fn label(&self, index: usize) -> Result<String, FormatError> {
        match self {
            Self::Numeric => Ok((index + 1).to_string()),
            Self::Alphabetic => Ok(alphabetic(index)),
            Self::Custom { labels } if labels.is_empty() => Err(FormatError::InvalidLabels(
                "custom scheme needs at least one label".to_string(),
            )),
            Self::Custom { labels } => Ok(labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| (index + 1).to_string())),
        }
    }
}

/// Bijective base-26 column name
fn alphabetic(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
