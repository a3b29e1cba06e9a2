use super::chain::ChainLabel;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-residue structural classification used to pick ribbon shape and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecondaryStructure {
    Helix,
    Sheet,
    /// Any residue not covered by a helix or sheet record.
    #[default]
    Loop,
}

impl SecondaryStructure {
    pub fn is_loop(&self) -> bool {
        *self == SecondaryStructure::Loop
    }
}

#[derive(Debug, Error)]
#[error("Invalid secondary structure string")]
pub struct ParseSecondaryStructureError;

impl FromStr for SecondaryStructure {
    type Err = ParseSecondaryStructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "helix" | "h" => Ok(Self::Helix),
            "sheet" | "strand" | "e" => Ok(Self::Sheet),
            "loop" | "coil" | "l" => Ok(Self::Loop),
            _ => Err(ParseSecondaryStructureError),
        }
    }
}

impl fmt::Display for SecondaryStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Helix => "Helix",
                Self::Sheet => "Sheet",
                Self::Loop => "Loop",
            }
        )
    }
}

/// An inclusive residue-number interval on one chain carrying a structure type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryRange {
    pub chain: ChainLabel,
    pub start: i32,
    pub end: i32,
    pub kind: SecondaryStructure,
}

impl SecondaryRange {
    pub fn new(chain: ChainLabel, start: i32, end: i32, kind: SecondaryStructure) -> Self {
        Self {
            chain,
            start: start.min(end),
            end: start.max(end),
            kind,
        }
    }

    pub fn contains(&self, chain: &ChainLabel, residue_number: i32) -> bool {
        self.chain == *chain && (self.start..=self.end).contains(&residue_number)
    }
}

/// Secondary-structure ranges collected from `HELIX` and `SHEET` records.
///
/// Sheet ranges take precedence over helix ranges where both cover a residue;
/// residues covered by neither are [`SecondaryStructure::Loop`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryStructureMap {
    ranges: Vec<SecondaryRange>,
}

impl SecondaryStructureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, range: SecondaryRange) {
        if !range.kind.is_loop() {
            self.ranges.push(range);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[SecondaryRange] {
        &self.ranges
    }

    pub fn classify(&self, chain: &ChainLabel, residue_number: i32) -> SecondaryStructure {
        let mut result = SecondaryStructure::Loop;
        for range in &self.ranges {
            if range.contains(chain, residue_number) {
                match range.kind {
                    SecondaryStructure::Sheet => return SecondaryStructure::Sheet,
                    kind => result = kind,
                }
            }
        }
        result
    }
}
