use crate::core::models::chain::ChainLabel;
use crate::core::models::element::Element;
use crate::core::models::secondary::{SecondaryRange, SecondaryStructure, SecondaryStructureMap};
use crate::core::utils::identifiers::element_symbol_from_atom_name;
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

const MIN_ATOM_LENGTH: usize = 54;
const MIN_SECONDARY_LENGTH: usize = 37;
/// Coordinates outside what an 8.3 fixed-width column can hold.
const MIN_COORDINATE: f64 = -999.999;
const MAX_COORDINATE: f64 = 9999.999;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Line is too short for {record} record ({actual} < {min} chars)")]
    LineTooShort {
        record: &'static str,
        min: usize,
        actual: usize,
    },
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Coordinate in columns {columns} is outside the fixed-column range (value: '{value}')")]
    CoordinateOutOfRange { columns: &'static str, value: String },
}

/// A line that was recognized but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub error: RecordError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub serial: i32,
    pub name: String,
    pub alt_loc: Option<char>,
    pub residue_name: String,
    pub chain: ChainLabel,
    pub residue_number: i32,
    pub insertion_code: Option<char>,
    pub position: Point3<f64>,
    pub element: Element,
    pub is_hetero: bool,
    pub line_number: usize,
}

impl AtomRecord {
    /// Whether this record belongs to the primary conformer (blank or `A`).
    pub fn is_primary_conformer(&self) -> bool {
        matches!(self.alt_loc, None | Some('A'))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Header {
        classification: String,
        deposition_date: String,
        identifier: String,
    },
    Title(String),
    Author(String),
    Atom(AtomRecord),
    Helix(SecondaryRange),
    Sheet(SecondaryRange),
    /// `MODEL` with its serial number, when one is present and readable.
    Model(Option<u32>),
    EndModel,
    Terminator,
    Remark(String),
    End,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_int(line: &str, start: usize, end: usize, columns: &'static str) -> Result<i32, RecordError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| RecordError::InvalidInt {
        columns,
        value: value.to_string(),
    })
}

fn parse_float(
    line: &str,
    start: usize,
    end: usize,
    columns: &'static str,
) -> Result<f64, RecordError> {
    let value = slice_and_trim(line, start, end);
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RecordError::InvalidFloat {
            columns,
            value: value.to_string(),
        })
}

fn parse_coordinate(
    line: &str,
    start: usize,
    end: usize,
    columns: &'static str,
) -> Result<f64, RecordError> {
    let value = parse_float(line, start, end, columns)?;
    if (MIN_COORDINATE..=MAX_COORDINATE).contains(&value) {
        Ok(value)
    } else {
        Err(RecordError::CoordinateOutOfRange {
            columns,
            value: slice_and_trim(line, start, end).to_string(),
        })
    }
}

fn require_length(line: &str, record: &'static str, min: usize) -> Result<(), RecordError> {
    if line.len() < min {
        Err(RecordError::LineTooShort {
            record,
            min,
            actual: line.len(),
        })
    } else {
        Ok(())
    }
}

fn resolve_element(line: &str) -> Element {
    let explicit = slice_and_trim(line, 76, 78);
    if !explicit.is_empty() {
        return Element::from_symbol(explicit);
    }
    let raw_name = line.get(12..16).unwrap_or("");
    element_symbol_from_atom_name(raw_name)
        .map(|symbol| Element::from_symbol(&symbol))
        .unwrap_or_default()
}

fn parse_atom(line: &str, line_number: usize, is_hetero: bool) -> Result<AtomRecord, RecordError> {
    require_length(line, if is_hetero { "HETATM" } else { "ATOM" }, MIN_ATOM_LENGTH)?;

    let serial = parse_int(line, 6, 11, "7-11").unwrap_or(0);
    let residue_number = parse_int(line, 22, 26, "23-26")?;
    let x = parse_coordinate(line, 30, 38, "31-38")?;
    let y = parse_coordinate(line, 38, 46, "39-46")?;
    let z = parse_coordinate(line, 46, 54, "47-54")?;

    Ok(AtomRecord {
        serial,
        name: slice_and_trim(line, 12, 16).to_string(),
        alt_loc: column_char(line, 16),
        residue_name: slice_and_trim(line, 17, 20).to_string(),
        chain: ChainLabel::new(slice_and_trim(line, 21, 22)),
        residue_number,
        insertion_code: column_char(line, 26),
        position: Point3::new(x, y, z),
        element: resolve_element(line),
        is_hetero,
        line_number,
    })
}

fn parse_helix(line: &str) -> Result<SecondaryRange, RecordError> {
    require_length(line, "HELIX", MIN_SECONDARY_LENGTH)?;
    let start = parse_int(line, 21, 25, "22-25")?;
    let end = parse_int(line, 33, 37, "34-37")?;
    Ok(SecondaryRange::new(
        ChainLabel::new(slice_and_trim(line, 19, 20)),
        start,
        end,
        SecondaryStructure::Helix,
    ))
}

fn parse_sheet(line: &str) -> Result<SecondaryRange, RecordError> {
    require_length(line, "SHEET", MIN_SECONDARY_LENGTH)?;
    let start = parse_int(line, 22, 26, "23-26")?;
    let end = parse_int(line, 33, 37, "34-37")?;
    Ok(SecondaryRange::new(
        ChainLabel::new(slice_and_trim(line, 21, 22)),
        start,
        end,
        SecondaryStructure::Sheet,
    ))
}

fn parse_model(line: &str) -> Option<u32> {
    let serial = slice_and_trim(line, 10, 14);
    let serial = if serial.is_empty() {
        slice_and_trim(line, 6, line.len())
    } else {
        serial
    };
    serial.parse().ok()
}

/// Parses one line into a typed record.
///
/// Returns `Ok(None)` for record types that carry nothing this crate uses.
pub fn parse_line(line: &str, line_number: usize) -> Result<Option<Record>, RecordError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let tag = slice_and_trim(line, 0, 6);

    let record = match tag {
        "ATOM" => Record::Atom(parse_atom(line, line_number, false)?),
        "HETATM" => Record::Atom(parse_atom(line, line_number, true)?),
        "HELIX" => Record::Helix(parse_helix(line)?),
        "SHEET" => Record::Sheet(parse_sheet(line)?),
        "MODEL" => Record::Model(parse_model(line)),
        "ENDMDL" => Record::EndModel,
        "TER" => Record::Terminator,
        "END" => Record::End,
        "HEADER" => Record::Header {
            classification: slice_and_trim(line, 10, 50).to_string(),
            deposition_date: slice_and_trim(line, 50, 59).to_string(),
            identifier: slice_and_trim(line, 62, 66).to_string(),
        },
        "TITLE" => Record::Title(slice_and_trim(line, 10, 80).to_string()),
        "AUTHOR" => Record::Author(slice_and_trim(line, 10, 80).to_string()),
        "REMARK" => Record::Remark(slice_and_trim(line, 6, line.len()).to_string()),
        _ => return Ok(None),
    };
    Ok(Some(record))
}

/// Extracts the number following an `ENERGY` keyword in a remark, if any.
///
/// Accepts `ENERGY -123.4`, `ENERGY: -123.4` and `ENERGY = -123.4`.
pub fn remark_energy(text: &str) -> Option<f64> {
    let mut tokens = text
        .split(|c: char| c.is_whitespace() || c == ':' || c == '=')
        .filter(|t| !t.is_empty());
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("ENERGY") {
            return tokens.next()?.parse().ok().filter(|v: &f64| v.is_finite());
        }
    }
    None
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderInfo {
    pub identifier: Option<String>,
    pub classification: Option<String>,
    pub deposition_date: Option<String>,
}

/// Everything the parser extracted from one input.
///
/// Metadata and secondary-structure ranges are collected into flat tables; the
/// records that drive model assembly are kept in file order in `stream`.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub header: HeaderInfo,
    pub title_lines: Vec<String>,
    pub author_lines: Vec<String>,
    pub secondary: SecondaryStructureMap,
    /// `ATOM`/`HETATM`, `MODEL`, `ENDMDL`, `TER` and `REMARK` records in file order.
    pub stream: Vec<Record>,
    pub skipped: Vec<SkippedLine>,
    /// Atom records dropped because they belong to a non-primary alternate location.
    pub alternate_conformers: usize,
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

impl RecordSet {
    /// Reads every line of `reader`.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than failing the read, so
    /// a stray Latin-1 remark costs at most its own line.
    pub fn read_from(reader: &mut impl BufRead) -> io::Result<Self> {
        let mut set = Self::default();
        let mut buffer = Vec::new();
        let mut line_number = 0;
        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let line = String::from_utf8_lossy(&buffer);
            set.ingest(line.trim_end_matches(['\r', '\n']), line_number);
        }
        Ok(set)
    }

    pub fn parse_str(text: &str) -> Self {
        let mut set = Self::default();
        for (index, line) in text.lines().enumerate() {
            set.ingest(line, index + 1);
        }
        set
    }

    fn ingest(&mut self, line: &str, line_number: usize) {
        let record = match parse_line(line, line_number) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(error) => {
                debug!(line = line_number, %error, "Skipping malformed record");
                self.skipped.push(SkippedLine { line_number, error });
                return;
            }
        };

        match record {
            Record::Header {
                classification,
                deposition_date,
                identifier,
            } => {
                self.header = HeaderInfo {
                    identifier: non_empty(identifier),
                    classification: non_empty(classification),
                    deposition_date: non_empty(deposition_date),
                };
            }
            Record::Title(text) if !text.is_empty() => self.title_lines.push(text),
            Record::Author(text) if !text.is_empty() => self.author_lines.push(text),
            Record::Title(_) | Record::Author(_) | Record::End => {}
            Record::Helix(range) | Record::Sheet(range) => self.secondary.add(range),
            Record::Atom(atom) if !atom.is_primary_conformer() => {
                self.alternate_conformers += 1;
            }
            other => self.stream.push(other),
        }
    }

    pub fn atom_records(&self) -> impl Iterator<Item = &AtomRecord> {
        self.stream.iter().filter_map(|record| match record {
            Record::Atom(atom) => Some(atom),
            _ => None,
        })
    }

    pub fn title(&self) -> Option<String> {
        non_empty(self.title_lines.join(" "))
    }

    pub fn authors(&self) -> Option<String> {
        non_empty(self.author_lines.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALA_CA: &str =
        "ATOM      2  CA  ALA A  12      11.104   6.134  -6.504  1.00  0.00           C  ";

    #[test]
    fn parse_atom_reads_fixed_columns() {
        let Some(Record::Atom(atom)) = parse_line(ALA_CA, 3).unwrap() else {
            panic!("expected an atom record");
        };
        assert_eq!(atom.serial, 2);
        assert_eq!(atom.name, "CA");
        assert_eq!(atom.residue_name, "ALA");
        assert_eq!(atom.chain.as_str(), "A");
        assert_eq!(atom.residue_number, 12);
        assert_eq!(atom.position, Point3::new(11.104, 6.134, -6.504));
        assert_eq!(atom.element, Element::Carbon);
        assert_eq!(atom.line_number, 3);
        assert!(!atom.is_hetero);
        assert!(atom.is_primary_conformer());
    }

    #[test]
    fn blank_element_field_falls_back_to_atom_name() {
        let line = "HETATM  100 FE   HEM A 200      10.000  10.000  10.000";
        let Some(Record::Atom(atom)) = parse_line(line, 1).unwrap() else {
            panic!("expected an atom record");
        };
        assert_eq!(atom.element, Element::Iron);
        assert!(atom.is_hetero);

        let line = "ATOM      1  CA  GLY B   1       1.000   2.000   3.000";
        let Some(Record::Atom(atom)) = parse_line(line, 1).unwrap() else {
            panic!("expected an atom record");
        };
        assert_eq!(atom.element, Element::Carbon);
    }

    #[test]
    fn unknown_element_symbol_becomes_unknown() {
        let line = "ATOM      1  X1  UNK A   1       1.000   2.000   3.000  1.00  0.00          XX";
        let Some(Record::Atom(atom)) = parse_line(line, 1).unwrap() else {
            panic!("expected an atom record");
        };
        assert_eq!(atom.element, Element::Unknown);
    }

    #[test]
    fn truncated_atom_line_is_rejected() {
        let line = &ALA_CA[..40];
        assert!(matches!(
            parse_line(line, 1),
            Err(RecordError::LineTooShort { record: "ATOM", .. })
        ));
    }

    #[test]
    fn unparsable_coordinate_is_rejected() {
        let line = ALA_CA.replace("  6.134", "  abcde");
        assert!(matches!(
            parse_line(&line, 1),
            Err(RecordError::InvalidFloat { columns: "39-46", .. })
        ));
    }

    #[test]
    fn coordinates_beyond_column_width_are_rejected() {
        let line = ALA_CA.replace("  11.104", "    1e19");
        assert!(matches!(
            parse_line(&line, 1),
            Err(RecordError::CoordinateOutOfRange { columns: "31-38", .. })
        ));

        let line = ALA_CA.replace(" -6.504", "-1000.0");
        assert!(matches!(
            parse_line(&line, 1),
            Err(RecordError::CoordinateOutOfRange { columns: "47-54", .. })
        ));

        let line = ALA_CA.replace("  11.104", "9999.999");
        assert!(matches!(parse_line(&line, 1), Ok(Some(Record::Atom(_)))));
    }

    #[test]
    fn helix_and_sheet_columns_are_read() {
        let helix = "HELIX    1   1 ALA A   10  LEU A   20  1                                  11";
        let Some(Record::Helix(range)) = parse_line(helix, 1).unwrap() else {
            panic!("expected a helix record");
        };
        assert_eq!((range.chain.as_str(), range.start, range.end), ("A", 10, 20));

        let sheet = "SHEET    1   A 2 VAL B  30  ILE B  34  0";
        let Some(Record::Sheet(range)) = parse_line(sheet, 1).unwrap() else {
            panic!("expected a sheet record");
        };
        assert_eq!((range.chain.as_str(), range.start, range.end), ("B", 30, 34));
        assert_eq!(range.kind, SecondaryStructure::Sheet);
    }

    #[test]
    fn model_serial_is_optional() {
        assert_eq!(parse_line("MODEL        3", 1).unwrap(), Some(Record::Model(Some(3))));
        assert_eq!(parse_line("MODEL", 1).unwrap(), Some(Record::Model(None)));
    }

    #[test]
    fn unrecognized_records_are_ignored() {
        assert_eq!(parse_line("CRYST1   50.000", 1).unwrap(), None);
        assert_eq!(parse_line("", 1).unwrap(), None);
    }

    #[test]
    fn remark_energy_accepts_common_layouts() {
        assert_eq!(remark_energy("1 ENERGY -123.5"), Some(-123.5));
        assert_eq!(remark_energy("energy: 4.0 kcal/mol"), Some(4.0));
        assert_eq!(remark_energy("TOTAL ENERGY = 7"), Some(7.0));
        assert_eq!(remark_energy("2 RESOLUTION. 2.00 ANGSTROMS."), None);
        assert_eq!(remark_energy("ENERGY unknown"), None);
    }

    #[test]
    fn record_set_collects_metadata_and_skips_bad_lines() {
        let text = format!(
            "HEADER    HYDROLASE                               01-JAN-20   1ABC\n\
             TITLE     AN EXAMPLE\n\
             TITLE    2 STRUCTURE\n\
             AUTHOR    A.N. AUTHOR\n\
             {ALA_CA}\n\
             ATOM      3  C   ALA A  12\n\
             ATOM      4  CB BALA A  12      12.000   6.000  -6.000  1.00  0.00           C\n\
             END\n"
        );
        let set = RecordSet::parse_str(&text);
        assert_eq!(set.header.identifier.as_deref(), Some("1ABC"));
        assert_eq!(set.header.classification.as_deref(), Some("HYDROLASE"));
        assert_eq!(set.title().as_deref(), Some("AN EXAMPLE STRUCTURE"));
        assert_eq!(set.authors().as_deref(), Some("A.N. AUTHOR"));
        assert_eq!(set.atom_records().count(), 1);
        assert_eq!(set.skipped.len(), 1);
        assert_eq!(set.skipped[0].line_number, 6);
        assert_eq!(set.alternate_conformers, 1);
    }

    #[test]
    fn invalid_utf8_remark_does_not_abort_reading() {
        let mut bytes = b"REMARK   1 AUTHOR M\xdcLLER\r\n".to_vec();
        bytes.extend_from_slice(ALA_CA.as_bytes());
        bytes.push(b'\n');

        let set = RecordSet::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(set.atom_records().count(), 1);
        assert!(set.skipped.is_empty());
        assert_eq!(set.atom_records().next().unwrap().line_number, 2);
        assert!(matches!(&set.stream[0], Record::Remark(text) if text.starts_with("1 AUTHOR M")));
    }
}
