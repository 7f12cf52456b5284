use std::sync::Arc;

use super::{BuildEntry, BuildInput, PrimitiveBuildInput};
use crate::geometry::MaterialRecord;

/// Build inputs for one acceleration structure build, in insertion order.
///
/// The position of an input is the geometry index the builder assigns to it,
/// so entries are never reordered or deduplicated.
#[derive(Clone, Debug, Default)]
pub struct BuildInputList {
    inputs: Vec<Arc<BuildInput>>,
}

impl BuildInputList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, input: Arc<BuildInput>) {
        self.inputs.push(input);
    }

    /// Drops this list's references. Inputs held elsewhere stay alive.
    pub fn clear(&mut self) {
        self.inputs.clear();
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<BuildInput>> {
        self.inputs.iter()
    }

    /// One entry per input, in insertion order.
    pub fn build(&self) -> Vec<BuildEntry> {
        tracing::debug!(num_inputs = self.inputs.len(), "build inputs");
        self.inputs.iter().map(|input| input.build()).collect()
    }

    /// Material table indexed by geometry index.
    pub fn material_records(&self) -> Vec<MaterialRecord> {
        self.inputs
            .iter()
            .map(|input| MaterialRecord::from(input.material()))
            .collect()
    }
}

impl From<Arc<BuildInput>> for BuildInputList {
    fn from(input: Arc<BuildInput>) -> Self {
        Self {
            inputs: vec![input],
        }
    }
}

impl FromIterator<Arc<BuildInput>> for BuildInputList {
    fn from_iter<T: IntoIterator<Item = Arc<BuildInput>>>(iter: T) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BuildInputList {
    type Item = &'a Arc<BuildInput>;
    type IntoIter = std::slice::Iter<'a, Arc<BuildInput>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inputs.iter()
    }
}
