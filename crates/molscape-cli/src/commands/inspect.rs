use super::load_structure;
use crate::cli::InspectArgs;
use crate::error::Result;
use molscape::core::models::model::{Composition, Model};
use molscape::core::models::structure::StructureFile;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
pub struct ChainSummary {
    pub label: String,
    pub residues: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelSummary<'a> {
    pub number: u32,
    pub atoms: usize,
    pub residues: usize,
    pub energy: Option<f64>,
    pub chains: Vec<ChainSummary>,
    pub composition: &'a Composition,
}

#[derive(Debug, Serialize)]
pub struct StructureSummary<'a> {
    pub identifier: Option<&'a str>,
    pub classification: Option<&'a str>,
    pub deposition_date: Option<&'a str>,
    pub title: Option<&'a str>,
    pub authors: Option<&'a str>,
    pub models: Vec<ModelSummary<'a>>,
}

fn summarize_model(model: &Model) -> ModelSummary<'_> {
    ModelSummary {
        number: model.number(),
        atoms: model.atom_count(),
        residues: model.residue_count(),
        energy: model.energy(),
        chains: model
            .chains_iter()
            .map(|(_, chain)| ChainSummary {
                label: chain.label.to_string(),
                residues: chain.residues().len(),
            })
            .collect(),
        composition: model.composition(),
    }
}

pub fn summarize(structure: &StructureFile) -> StructureSummary<'_> {
    StructureSummary {
        identifier: structure.identifier.as_deref(),
        classification: structure.classification.as_deref(),
        deposition_date: structure.deposition_date.as_deref(),
        title: structure.title.as_deref(),
        authors: structure.authors.as_deref(),
        models: structure.models().iter().map(summarize_model).collect(),
    }
}

fn join_counts<K>(counts: impl IntoIterator<Item = (K, usize)>, label: impl Fn(K) -> String) -> String {
    counts
        .into_iter()
        .map(|(key, count)| format!("{} {}", label(key), count))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_text(summary: &StructureSummary) -> String {
    let mut out = String::new();
    let field = |value: Option<&str>| value.unwrap_or("-").to_string();

    let _ = writeln!(out, "Identifier:     {}", field(summary.identifier));
    let _ = writeln!(out, "Classification: {}", field(summary.classification));
    let _ = writeln!(out, "Deposited:      {}", field(summary.deposition_date));
    let _ = writeln!(out, "Title:          {}", field(summary.title));
    let _ = writeln!(out, "Authors:        {}", field(summary.authors));
    let _ = writeln!(out, "Models:         {}", summary.models.len());

    for model in &summary.models {
        let _ = writeln!(out);
        let _ = write!(
            out,
            "Model {}: {} atoms, {} residues, {} chain segments",
            model.number,
            model.atoms,
            model.residues,
            model.chains.len()
        );
        match model.energy {
            Some(energy) => {
                let _ = writeln!(out, ", energy {:.4}", energy);
            }
            None => {
                let _ = writeln!(out);
            }
        }

        let composition = model.composition;
        let _ = writeln!(
            out,
            "  Chains:    {}",
            join_counts(
                model.chains.iter().map(|c| (c.label.as_str(), c.residues)),
                |label| label.to_string()
            )
        );
        let _ = writeln!(
            out,
            "  Elements:  {}",
            join_counts(
                composition.atoms_per_element.iter().map(|(e, &n)| (e, n)),
                |e| e.symbol().to_string()
            )
        );
        let _ = writeln!(
            out,
            "  Secondary: {}",
            join_counts(
                composition.residues_per_secondary.iter().map(|(s, &n)| (s, n)),
                |s| s.to_string()
            )
        );
        let _ = writeln!(
            out,
            "  Residues:  {}",
            join_counts(
                composition.residues_per_name.iter().map(|(name, &n)| (name, n)),
                |name| name.clone()
            )
        );
    }
    out
}

pub fn run(args: InspectArgs) -> Result<()> {
    let structure = load_structure(&args.input)?;
    let summary = summarize(&structure);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_text(&summary));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use molscape::core::io::pdb::PdbFile;
    use molscape::core::io::traits::MolecularFile;

    const PEPTIDE: &str = "\
HEADER    DE NOVO PROTEIN                         01-JAN-20   1ABC
TITLE     TWO RESIDUE TEST
MODEL        1
REMARK   1 ENERGY -12.5
ATOM      1  N   GLY A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  GLY A   1       1.450   0.000   0.000  1.00  0.00           C
ATOM      3  N   SER A   2       3.300   1.600   0.000  1.00  0.00           N
ATOM      4  CA  SER A   2       3.900   2.900   0.000  1.00  0.00           C
ENDMDL
";

    #[test]
    fn summary_reports_header_and_model_counts() {
        let structure = PdbFile::read_from_str(PEPTIDE).unwrap();
        let summary = summarize(&structure);
        assert_eq!(summary.identifier, Some("1ABC"));
        assert_eq!(summary.title, Some("TWO RESIDUE TEST"));
        assert_eq!(summary.models.len(), 1);
        let model = &summary.models[0];
        assert_eq!(model.atoms, 4);
        assert_eq!(model.residues, 2);
        assert_eq!(model.energy, Some(-12.5));
        assert_eq!(model.chains.len(), 1);
        assert_eq!(model.chains[0].label, "A");
    }

    #[test]
    fn text_report_lists_composition() {
        let structure = PdbFile::read_from_str(PEPTIDE).unwrap();
        let text = render_text(&summarize(&structure));
        assert!(text.contains("Identifier:     1ABC"));
        assert!(text.contains("Model 1: 4 atoms, 2 residues, 1 chain segments, energy -12.5000"));
        assert!(text.contains("C 2, N 2"));
        assert!(text.contains("GLY 1, SER 1"));
        assert!(text.contains("Loop 2"));
    }

    #[test]
    fn json_summary_uses_string_keys() {
        let structure = PdbFile::read_from_str(PEPTIDE).unwrap();
        let json = serde_json::to_value(summarize(&structure)).unwrap();
        assert_eq!(json["models"][0]["composition"]["residues_per_name"]["GLY"], 1);
        assert_eq!(json["models"][0]["composition"]["atoms_per_element"]["Carbon"], 2);
    }
}
