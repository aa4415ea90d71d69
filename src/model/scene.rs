use itertools::Itertools;

use super::HiddenObject;
use crate::errors::SceneLoadError;

/// One level's background and its hidden-object set. Read-only once built.
#[readonly::make]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// 1-based position in the level sequence.
    pub level_index: usize,
    pub background: String,
    pub objects: Vec<HiddenObject>,
}

impl Scene {
    /// Builds a scene, rejecting object sets that could never be completed cleanly:
    /// empty sets, duplicate ids and regions with negative extent.
    pub fn new(
        level_index: usize,
        background: impl Into<String>,
        objects: Vec<HiddenObject>,
    ) -> Result<Self, SceneLoadError> {
        if objects.is_empty() {
            return Err(SceneLoadError::EmptyScene { level: level_index });
        }
        if let Some(id) = objects.iter().map(|o| &o.id).duplicates().next() {
            return Err(SceneLoadError::DuplicateObjectId {
                level: level_index,
                id: id.clone(),
            });
        }
        if let Some(object) = objects.iter().find(|o| {
            !o.primary_region.is_well_formed() || !o.secondary_region.is_well_formed()
        }) {
            return Err(SceneLoadError::MalformedRegion {
                level: level_index,
                id: object.id.clone(),
            });
        }
        Ok(Self {
            level_index,
            background: background.into(),
            objects,
        })
    }

    pub fn object(&self, id: &str) -> Option<&HiddenObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.object(id).is_some()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}
