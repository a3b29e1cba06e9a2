use crate::core::models::element::Element;
use crate::core::models::residue::ResidueClass;
use phf::{Map, Set, phf_map, phf_set};

static RESIDUE_CLASSES: Map<&'static str, ResidueClass> = phf_map! {
    "ALA" => ResidueClass::Hydrophobic, "VAL" => ResidueClass::Hydrophobic,
    "LEU" => ResidueClass::Hydrophobic, "ILE" => ResidueClass::Hydrophobic,
    "MET" => ResidueClass::Hydrophobic, "PHE" => ResidueClass::Hydrophobic,
    "TRP" => ResidueClass::Hydrophobic, "PRO" => ResidueClass::Hydrophobic,
    "GLY" => ResidueClass::Hydrophobic,
    "SER" => ResidueClass::Polar, "THR" => ResidueClass::Polar,
    "ASN" => ResidueClass::Polar, "GLN" => ResidueClass::Polar,
    "TYR" => ResidueClass::Polar, "CYS" => ResidueClass::Polar,
    "ASP" => ResidueClass::Acidic, "GLU" => ResidueClass::Acidic,
    "LYS" => ResidueClass::Basic, "ARG" => ResidueClass::Basic, "HIS" => ResidueClass::Basic,
};

// Two-letter symbols that may appear left-justified in the atom-name field.
static MULTI_LETTER_ELEMENTS: Set<&'static str> = phf_set! {
    "FE", "ZN", "MG", "MN", "CU", "NA", "CL", "BR", "SE", "CA", "CO", "NI",
};

pub fn residue_class(residue_name: &str) -> ResidueClass {
    RESIDUE_CLASSES
        .get(residue_name.trim())
        .copied()
        .unwrap_or_default()
}

/// Infers an element symbol from the raw, untrimmed four-character atom-name field.
///
/// Two-letter metals and halogens are written starting in the first column of the
/// field (`"FE  "`), while single-letter elements start in the second (`" CA "` is an
/// alpha carbon, `"CA  "` is calcium). Leading digits (`"1HB "`) are skipped.
pub fn element_symbol_from_atom_name(raw_name: &str) -> Option<String> {
    let mut chars = raw_name.chars();
    if let (Some(first), Some(second)) = (chars.next(), chars.next()) {
        if first.is_ascii_alphabetic() && second.is_ascii_alphabetic() {
            let pair: String = [first, second]
                .iter()
                .map(|c| c.to_ascii_uppercase())
                .collect();
            if MULTI_LETTER_ELEMENTS.contains(pair.as_str()) {
                return Some(pair);
            }
        }
    }
    raw_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
}

/// Whether an atom is the per-residue anchor used to trace a backbone curve:
/// the alpha carbon of an amino acid or the phosphorus of a nucleotide.
pub fn is_backbone_anchor(atom_name: &str, element: Element) -> bool {
    matches!(
        (atom_name.trim(), element),
        ("CA", Element::Carbon) | ("P", Element::Phosphorus)
    )
}
