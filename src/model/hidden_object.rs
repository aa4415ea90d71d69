use serde::{Deserialize, Serialize};

use super::Region;

pub type ObjectId = String;

/// One object the player has to find.
///
/// `primary_region` is the hit box inside the scene; `secondary_region` is the
/// indicator area (thumbnail strip or frame) that is crossed out at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenObject {
    pub id: ObjectId,
    pub primary_region: Region,
    pub secondary_region: Region,
}

impl HiddenObject {
    pub fn new(id: impl Into<ObjectId>, primary_region: Region, secondary_region: Region) -> Self {
        Self {
            id: id.into(),
            primary_region,
            secondary_region,
        }
    }

    /// An object whose indicator area is the hit box itself.
    pub fn with_single_region(id: impl Into<ObjectId>, region: Region) -> Self {
        Self::new(id, region, region)
    }
}
