use super::model::Model;

/// File-level metadata plus the ordered list of models.
///
/// Always holds at least one non-empty model; an input with zero atoms never
/// produces a `StructureFile`.
#[derive(Debug, Clone, Default)]
pub struct StructureFile {
    /// Four-character identifier from the `HEADER` record.
    pub identifier: Option<String>,
    /// Classification text from the `HEADER` record.
    pub classification: Option<String>,
    pub deposition_date: Option<String>,
    /// `TITLE` continuation lines joined with single spaces.
    pub title: Option<String>,
    /// `AUTHOR` continuation lines joined with single spaces.
    pub authors: Option<String>,
    pub(crate) models: Vec<Model>,
}

impl StructureFile {
    pub(crate) fn new(models: Vec<Model>) -> Self {
        Self {
            models,
            ..Self::default()
        }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// The model at zero-based `index`.
    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn total_atoms(&self) -> usize {
        self.models.iter().map(Model::atom_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{ModelBuilder, NewAtom};
    use crate::core::models::element::Element;
    use nalgebra::Point3;

    fn one_atom_model(number: u32) -> Model {
        let mut builder = ModelBuilder::new(number);
        builder.add_atom(NewAtom {
            serial: 1,
            name: "CA",
            element: Element::Carbon,
            position: Point3::origin(),
            residue_name: "GLY",
            residue_number: 1,
            insertion_code: None,
            is_hetero: false,
            line_number: 1,
        });
        builder.build()
    }

    #[test]
    fn model_accessors_follow_file_order() {
        let file = StructureFile::new(vec![one_atom_model(1), one_atom_model(2)]);
        assert_eq!(file.model_count(), 2);
        assert_eq!(file.first_model().unwrap().number(), 1);
        assert_eq!(file.model(1).unwrap().number(), 2);
        assert!(file.model(2).is_none());
        assert_eq!(file.total_atoms(), 2);
    }
}
