use phf::{Map, phf_map};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Chemical elements recognized by the structure reader.
///
/// The set covers the organic elements, halogens and the metal ions that commonly
/// appear as `HETATM` records in deposited structures. Any other symbol resolves to
/// [`Element::Unknown`], which is excluded from bond inference and backbone tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum Element {
    Hydrogen,
    Carbon,
    Nitrogen,
    Oxygen,
    Fluorine,
    Sodium,
    Magnesium,
    Phosphorus,
    Sulfur,
    Chlorine,
    Potassium,
    Calcium,
    Manganese,
    Iron,
    Cobalt,
    Nickel,
    Copper,
    Zinc,
    Selenium,
    Bromine,
    Iodine,
    /// Sentinel for any symbol missing from the element table.
    #[default]
    Unknown,
}

/// Van der Waals radius used for elements without a table entry (Å).
pub const DEFAULT_VDW_RADIUS: f64 = 1.5;

/// Bond count assumed for elements without an explicit valence limit.
pub const DEFAULT_MAX_BONDS: usize = 2;

static SYMBOL_TABLE: Map<&'static str, Element> = phf_map! {
    "H" => Element::Hydrogen,
    "D" => Element::Hydrogen,
    "C" => Element::Carbon,
    "N" => Element::Nitrogen,
    "O" => Element::Oxygen,
    "F" => Element::Fluorine,
    "NA" => Element::Sodium,
    "MG" => Element::Magnesium,
    "P" => Element::Phosphorus,
    "S" => Element::Sulfur,
    "CL" => Element::Chlorine,
    "K" => Element::Potassium,
    "CA" => Element::Calcium,
    "MN" => Element::Manganese,
    "FE" => Element::Iron,
    "CO" => Element::Cobalt,
    "NI" => Element::Nickel,
    "CU" => Element::Copper,
    "ZN" => Element::Zinc,
    "SE" => Element::Selenium,
    "BR" => Element::Bromine,
    "I" => Element::Iodine,
};

impl Element {
    /// Resolves an element symbol, case-insensitively and ignoring surrounding blanks.
    ///
    /// Unrecognized or empty symbols map to [`Element::Unknown`] rather than failing.
    pub fn from_symbol(symbol: &str) -> Self {
        let symbol = symbol.trim().to_ascii_uppercase();
        SYMBOL_TABLE
            .get(symbol.as_str())
            .copied()
            .unwrap_or(Element::Unknown)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::Hydrogen => "H",
            Element::Carbon => "C",
            Element::Nitrogen => "N",
            Element::Oxygen => "O",
            Element::Fluorine => "F",
            Element::Sodium => "Na",
            Element::Magnesium => "Mg",
            Element::Phosphorus => "P",
            Element::Sulfur => "S",
            Element::Chlorine => "Cl",
            Element::Potassium => "K",
            Element::Calcium => "Ca",
            Element::Manganese => "Mn",
            Element::Iron => "Fe",
            Element::Cobalt => "Co",
            Element::Nickel => "Ni",
            Element::Copper => "Cu",
            Element::Zinc => "Zn",
            Element::Selenium => "Se",
            Element::Bromine => "Br",
            Element::Iodine => "I",
            Element::Unknown => "X",
        }
    }

    /// Van der Waals radius in Ångström (Bondi radii, metals from Alvarez).
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Element::Hydrogen => 1.20,
            Element::Carbon => 1.70,
            Element::Nitrogen => 1.55,
            Element::Oxygen => 1.52,
            Element::Fluorine => 1.47,
            Element::Sodium => 2.27,
            Element::Magnesium => 1.73,
            Element::Phosphorus => 1.80,
            Element::Sulfur => 1.80,
            Element::Chlorine => 1.75,
            Element::Potassium => 2.75,
            Element::Calcium => 2.31,
            Element::Manganese => 2.05,
            Element::Iron => 2.04,
            Element::Cobalt => 2.00,
            Element::Nickel => 1.63,
            Element::Copper => 1.40,
            Element::Zinc => 1.39,
            Element::Selenium => 1.90,
            Element::Bromine => 1.85,
            Element::Iodine => 1.98,
            Element::Unknown => DEFAULT_VDW_RADIUS,
        }
    }

    /// Heuristic upper bound on the number of bonds the element takes part in.
    pub fn max_bonds(&self) -> usize {
        match self {
            Element::Carbon => 4,
            Element::Nitrogen => 3,
            Element::Oxygen | Element::Sulfur => 2,
            Element::Hydrogen => 1,
            _ => DEFAULT_MAX_BONDS,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Element::Unknown
    }
}

impl FromStr for Element {
    type Err = ();

    /// Parses a symbol, rejecting anything that does not resolve to a known element.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Element::from_symbol(s) {
            Element::Unknown => Err(()),
            element => Ok(element),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_symbol_resolves_known_symbols_case_insensitively() {
        assert_eq!(Element::from_symbol("C"), Element::Carbon);
        assert_eq!(Element::from_symbol(" fe "), Element::Iron);
        assert_eq!(Element::from_symbol("Zn"), Element::Zinc);
        assert_eq!(Element::from_symbol("D"), Element::Hydrogen);
    }

    #[test]
    fn from_symbol_maps_unrecognized_symbols_to_unknown() {
        assert_eq!(Element::from_symbol("Xx"), Element::Unknown);
        assert_eq!(Element::from_symbol(""), Element::Unknown);
        assert_eq!(Element::from_symbol("123"), Element::Unknown);
    }

    #[test]
    fn max_bonds_follows_valence_table() {
        assert_eq!(Element::Carbon.max_bonds(), 4);
        assert_eq!(Element::Nitrogen.max_bonds(), 3);
        assert_eq!(Element::Oxygen.max_bonds(), 2);
        assert_eq!(Element::Sulfur.max_bonds(), 2);
        assert_eq!(Element::Hydrogen.max_bonds(), 1);
        assert_eq!(Element::Zinc.max_bonds(), DEFAULT_MAX_BONDS);
    }

    #[test]
    fn unknown_element_uses_default_radius() {
        assert_eq!(Element::Unknown.vdw_radius(), DEFAULT_VDW_RADIUS);
        assert!(Element::Unknown.is_unknown());
        assert!(!Element::Carbon.is_unknown());
    }

    #[test]
    fn from_str_rejects_unknown_symbols() {
        assert_eq!("O".parse::<Element>(), Ok(Element::Oxygen));
        assert!("Qq".parse::<Element>().is_err());
    }

    #[test]
    fn display_uses_conventional_capitalization() {
        assert_eq!(Element::Chlorine.to_string(), "Cl");
        assert_eq!(Element::Unknown.to_string(), "X");
    }
}
