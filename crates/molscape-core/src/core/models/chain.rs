use super::ids::ResidueId;
use serde::Serialize;
use std::fmt;

/// Chain identifier as written in the structure file.
///
/// Always non-empty and trimmed; a blank identifier becomes the canonical `"A"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChainLabel(String);

impl ChainLabel {
    pub const DEFAULT: &'static str = "A";

    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(Self::DEFAULT.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ChainLabel {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for ChainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChainLabel {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A contiguous chain segment inside one model.
///
/// A `TER` record closes the current segment, so the same label may own several
/// segments (e.g. the polymer and the waters that follow it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub label: ChainLabel,               // Chain identifier (e.g., "A", "B")
    pub(crate) residues: Vec<ResidueId>, // Residues in order of first appearance
}

impl Chain {
    pub(crate) fn new(label: ChainLabel) -> Self {
        Self {
            label,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_label_becomes_default() {
        assert_eq!(ChainLabel::new("   ").as_str(), "A");
        assert_eq!(ChainLabel::new("").as_str(), "A");
        assert_eq!(ChainLabel::default().as_str(), "A");
    }

    #[test]
    fn label_is_trimmed() {
        assert_eq!(ChainLabel::new(" B ").as_str(), "B");
        assert_eq!(ChainLabel::from("AB").to_string(), "AB");
    }
}
