use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, warn};
use serde::Deserialize;

use crate::errors::SceneLoadError;
use crate::model::{HiddenObject, Region, Scene};

/// Fetches the raw level document for a 1-based level index.
pub trait SceneSource {
    fn fetch(&self, level_index: usize) -> Result<String, SceneLoadError>;
}

/// Reads `level{n}.json` files from a directory, falling back to `fase{n}.json`.
#[derive(Debug, Clone)]
pub struct DirectorySceneSource {
    dir: PathBuf,
}

impl DirectorySceneSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The first candidate file that exists, else the preferred `level{n}.json` name.
    pub fn document_path(&self, level_index: usize) -> PathBuf {
        let preferred = self.dir.join(format!("level{}.json", level_index));
        if preferred.exists() {
            return preferred;
        }
        let legacy = self.dir.join(format!("fase{}.json", level_index));
        if legacy.exists() {
            legacy
        } else {
            preferred
        }
    }
}

impl SceneSource for DirectorySceneSource {
    fn fetch(&self, level_index: usize) -> Result<String, SceneLoadError> {
        let path = self.document_path(level_index);
        fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SceneLoadError::NotFound {
                    level: level_index,
                    path,
                }
            } else {
                SceneLoadError::Read {
                    level: level_index,
                    path,
                    source,
                }
            }
        })
    }
}

/// Level documents held in memory, keyed by level index.
#[derive(Debug, Clone, Default)]
pub struct InMemorySceneSource {
    documents: HashMap<usize, String>,
}

impl InMemorySceneSource {
    pub fn with_level(mut self, level_index: usize, document: impl Into<String>) -> Self {
        self.documents.insert(level_index, document.into());
        self
    }
}

impl SceneSource for InMemorySceneSource {
    fn fetch(&self, level_index: usize) -> Result<String, SceneLoadError> {
        self.documents
            .get(&level_index)
            .cloned()
            .ok_or(SceneLoadError::UnknownLevel { level: level_index })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDescriptor {
    id: String,
    #[serde(alias = "scene", alias = "cena")]
    primary_region: Region,
    #[serde(default, alias = "indicator", alias = "border", alias = "borda")]
    secondary_region: Option<Region>,
}

/// Either a bare array of objects or an object with an `objects` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LevelDocument {
    Objects(Vec<ObjectDescriptor>),
    Described {
        #[serde(alias = "objetos")]
        objects: Vec<ObjectDescriptor>,
        #[serde(default, alias = "background", alias = "imagem")]
        image: Option<String>,
    },
}

pub fn default_background(level_index: usize) -> String {
    format!("screen{:02}.png", level_index)
}

/// Parses a level document into a validated [`Scene`].
pub fn parse_level_document(level_index: usize, document: &str) -> Result<Scene, SceneLoadError> {
    let parsed: LevelDocument =
        serde_json::from_str(document).map_err(|source| SceneLoadError::Parse {
            level: level_index,
            source,
        })?;
    let (descriptors, image) = match parsed {
        LevelDocument::Objects(objects) => (objects, None),
        LevelDocument::Described { objects, image } => (objects, image),
    };
    let objects = descriptors
        .into_iter()
        .map(|d| {
            let secondary = d.secondary_region.unwrap_or(d.primary_region);
            HiddenObject::new(d.id, d.primary_region, secondary)
        })
        .collect();
    let background = image.unwrap_or_else(|| default_background(level_index));
    Scene::new(level_index, background, objects)
}

/// The ordered set of levels for one game.
pub struct SceneCatalog {
    source: Box<dyn SceneSource>,
    total_levels: usize,
}

impl SceneCatalog {
    pub fn new(source: Box<dyn SceneSource>, total_levels: usize) -> Self {
        Self {
            source,
            total_levels,
        }
    }

    pub fn total_levels(&self) -> usize {
        self.total_levels
    }

    pub fn load(&self, level_index: usize) -> Result<Scene, SceneLoadError> {
        if level_index == 0 || level_index > self.total_levels {
            return Err(SceneLoadError::UnknownLevel { level: level_index });
        }
        let document = self.source.fetch(level_index)?;
        match parse_level_document(level_index, &document) {
            Ok(scene) => {
                debug!(
                    target: "catalog",
                    "Loaded level {} ({} objects, background {})",
                    level_index,
                    scene.object_count(),
                    scene.background
                );
                Ok(scene)
            }
            Err(err) => {
                warn!(target: "catalog", "Rejected level {}: {}", level_index, err);
                Err(err)
            }
        }
    }
}
