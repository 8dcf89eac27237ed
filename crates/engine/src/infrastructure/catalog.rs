//! Static prefab catalog: the built-in prefab set, or one loaded from a
//! catalog file.

use std::path::Path;

use delve_domain::{PrefabCategory, PrefabId};
use serde::Deserialize;

use crate::infrastructure::ports::{PrefabCatalog, RepoError};

pub const ROOM_PREFIX: &str = "Dungeon/Rooms/";
pub const HALLWAY_PREFIX: &str = "Dungeon/Hallways/";
pub const GATE_PREFIX: &str = "Gates/";
pub const BASE_PREFIX: &str = "Base/";
pub const DEFAULT_BASE_PREFAB: &str = "Base/Vex_Courtyard_Base";

const BUILTIN_ROOMS: &[&str] = &[
    "Vex_Room_S_Archers",
    "Vex_Room_S_Bats",
    "Vex_Room_S_Duck",
    "Vex_Room_S_Empty",
    "Vex_Room_S_Lava_A",
    "Vex_Room_S_Lava_B",
    "Vex_Room_S_Lava_C_Hostile",
    "Vex_Room_S_Mages",
];

const BUILTIN_HALLWAYS: &[&str] = &[
    "Vex_Room_S_Hallway_A",
    "Vex_Room_S_Hallway_B",
    "Vex_Room_S_Hallway_C",
    "Vex_Room_S_Hallway_D",
    "Vex_Room_S_Hallway_E",
    "Vex_Room_S_Hallway_F",
    "Vex_Room_S_Hallway_G",
    "Vex_Room_S_Hallway_H",
    "Vex_Room_S_Hallway_I",
    "Vex_Room_S_Hallway_J",
    "Vex_Room_S_Hallway_K",
    "Vex_Room_S_Hallway_L",
    "Vex_Room_S_Hallway_M",
    "Vex_Room_S_Hallway_N",
    "Vex_Room_S_Hallway_O",
    "Vex_Room_S_Hallway_P",
    "Vex_Room_S_Hallway_Q",
    "Vex_Room_S_Hallway_R",
    "Vex_Room_S_Hallway_S",
    "Vex_Room_S_Hallway_T",
    "Vex_Room_S_Hallway_U",
    "Vex_Room_S_Hallway_V",
];

const BUILTIN_GATES: &[&str] = &[
    "Vex_Seperator_Gate_Blocked",
    "Vex_Seperator_Gate_Closed",
    "Vex_Seperator_Gate_Opened",
    "Vex_Seperator_Gate_Crawl",
    "Vex_Seperator_Gate_Jail",
    "Vex_Seperator_Gate_Lava",
    "Vex_Seperator_Gate_Lighted_Door",
    "Vex_Seperator_Gate_Peep",
    "Vex_Seperator_Gate_Spiked",
    "Vex_Seperator_Gate_Water",
];

/// On-disk catalog: either a flat list of prefab paths, sorted into
/// categories by directory, or explicit per-category sections.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Paths(Vec<PrefabId>),
    Sections(CatalogSections),
}

#[derive(Debug, Default, Deserialize)]
struct CatalogSections {
    #[serde(default)]
    rooms: Vec<PrefabId>,
    #[serde(default)]
    hallways: Vec<PrefabId>,
    #[serde(default)]
    gates: Vec<PrefabId>,
    #[serde(default)]
    base: Vec<PrefabId>,
}

/// Fixed, in-memory prefab catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    rooms: Vec<PrefabId>,
    hallways: Vec<PrefabId>,
    gates: Vec<PrefabId>,
    base: Vec<PrefabId>,
}

impl StaticCatalog {
    /// The prefab set shipped with the dungeon pack.
    pub fn builtin() -> Self {
        let prefixed = |prefix: &str, names: &[&str]| -> Vec<PrefabId> {
            names
                .iter()
                .filter_map(|name| PrefabId::new(format!("{prefix}{name}")).ok())
                .collect()
        };
        Self {
            rooms: prefixed(ROOM_PREFIX, BUILTIN_ROOMS),
            hallways: prefixed(HALLWAY_PREFIX, BUILTIN_HALLWAYS),
            gates: prefixed(GATE_PREFIX, BUILTIN_GATES),
            base: PrefabId::new(DEFAULT_BASE_PREFAB).into_iter().collect(),
        }
    }

    /// Sort discovered prefab paths into categories by directory.
    ///
    /// Anything containing the hallway marker is a hallway, wherever it lives.
    /// Paths outside the known directories are ignored.
    pub fn from_paths(paths: impl IntoIterator<Item = PrefabId>) -> Self {
        let mut catalog = Self::default();
        for path in paths {
            let id = path.as_str();
            if id.starts_with(BASE_PREFIX) {
                catalog.base.push(path);
            } else if id.starts_with(GATE_PREFIX) {
                catalog.gates.push(path);
            } else if path.is_hallway() {
                catalog.hallways.push(path);
            } else if id.starts_with(ROOM_PREFIX) {
                catalog.rooms.push(path);
            } else {
                tracing::debug!(prefab = %path, "Ignoring uncategorized prefab");
            }
        }
        catalog
    }

    pub fn from_json_str(json: &str) -> Result<Self, RepoError> {
        let file: CatalogFile =
            serde_json::from_str(json).map_err(RepoError::serialization)?;
        Ok(match file {
            CatalogFile::Paths(paths) => Self::from_paths(paths),
            CatalogFile::Sections(sections) => Self {
                rooms: sections.rooms,
                hallways: sections.hallways,
                gates: sections.gates,
                base: sections.base,
            },
        })
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RepoError::database("load_catalog", format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            rooms = catalog.rooms.len(),
            hallways = catalog.hallways.len(),
            gates = catalog.gates.len(),
            "Loaded prefab catalog"
        );
        Ok(catalog)
    }

    /// Copy of this catalog with one category emptied.
    pub fn without(mut self, category: PrefabCategory) -> Self {
        self.pool_mut(category).clear();
        self
    }

    fn pool(&self, category: PrefabCategory) -> &Vec<PrefabId> {
        match category {
            PrefabCategory::Room => &self.rooms,
            PrefabCategory::Hallway => &self.hallways,
            PrefabCategory::Gate => &self.gates,
            PrefabCategory::Base => &self.base,
        }
    }

    fn pool_mut(&mut self, category: PrefabCategory) -> &mut Vec<PrefabId> {
        match category {
            PrefabCategory::Room => &mut self.rooms,
            PrefabCategory::Hallway => &mut self.hallways,
            PrefabCategory::Gate => &mut self.gates,
            PrefabCategory::Base => &mut self.base,
        }
    }
}

impl PrefabCatalog for StaticCatalog {
    fn list_by_category(&self, category: PrefabCategory) -> Vec<PrefabId> {
        self.pool(category).clone()
    }
}
