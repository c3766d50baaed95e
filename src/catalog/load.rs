use rusqlite::{Connection, OpenFlags};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::{Catalog, CatalogError, CatalogGroup, CatalogItem, Category, TypeId};

const ITEMS_FILE: &str = "items.json";
const GROUPS_FILE: &str = "groups.json";

/// `items.json` entry as written by the catalog generator
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemRecord {
    #[serde(rename = "ID")]
    id: TypeId,
    name: String,
    #[serde(default)]
    lower: String,
    group: TypeId,
}

/// `groups.json` entry; the id is the map key
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GroupRecord {
    name: String,
    #[serde(default)]
    lower: String,
    category: i32,
}

fn lower_or_compute(lower: String, name: &str) -> String {
    if lower.is_empty() {
        name.to_lowercase()
    } else {
        lower
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl Catalog {
    /// Load a catalog from either a JSON directory or an SDE SQLite file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog = if path.is_dir() {
            Self::from_json_dir(path)?
        } else {
            Self::from_sde_sqlite(path)?
        };

        if catalog.item_count() == 0 {
            return Err(CatalogError::Empty);
        }

        info!(
            items = catalog.item_count(),
            groups = catalog.group_count(),
            "loaded catalog from {:?}",
            path
        );
        Ok(catalog)
    }

    /// Load `items.json` and `groups.json` from a directory
    pub fn from_json_dir(dir: &Path) -> Result<Self, CatalogError> {
        let groups: HashMap<TypeId, GroupRecord> = read_json(&dir.join(GROUPS_FILE))?;
        let items: HashMap<TypeId, ItemRecord> = read_json(&dir.join(ITEMS_FILE))?;

        let groups: HashMap<TypeId, CatalogGroup> = groups
            .into_iter()
            .map(|(id, g)| CatalogGroup {
                id,
                lower: lower_or_compute(g.lower, &g.name),
                name: g.name,
                category: Category::from_code(g.category),
            })
            .filter(|g| g.category.is_fittable())
            .map(|g| (g.id, g))
            .collect();
        let items: Vec<CatalogItem> = items
            .into_values()
            .filter(|i| groups.contains_key(&i.group))
            .map(|i| CatalogItem {
                id: i.id,
                lower: lower_or_compute(i.lower, &i.name),
                name: i.name,
                group_id: i.group,
            })
            .collect();

        Ok(Self::new(items, groups.into_values()))
    }

    /// Load groups and types from a database produced by `eve-sde-to-sqlite`.
    ///
    /// Only groups in the ship, module, charge and subsystem categories are
    /// kept, along with the types that belong to them.
    pub fn from_sde_sqlite(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let categories = fittable_codes();

        let mut stmt = conn.prepare(&format!(
            "SELECT id, name_en, category_id FROM groups WHERE category_id IN ({})",
            categories
        ))?;
        let groups = stmt
            .query_map([], |row| {
                let name: Option<String> = row.get(1)?;
                Ok(CatalogGroup::new(
                    row.get(0)?,
                    name.unwrap_or_default(),
                    Category::from_code(row.get(2)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = groups.len(), "read SDE groups");

        let mut stmt = conn.prepare(&format!(
            "SELECT t.id, t.name_en, t.group_id FROM types t \
             JOIN groups g ON g.id = t.group_id \
             WHERE g.category_id IN ({})",
            categories
        ))?;
        let items = stmt
            .query_map([], |row| {
                let name: Option<String> = row.get(1)?;
                Ok(CatalogItem::new(
                    row.get(0)?,
                    name.unwrap_or_default(),
                    row.get(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = items.len(), "read SDE types");

        Ok(Self::new(items, groups))
    }
}

/// SQL list of the category codes catalog loading keeps
fn fittable_codes() -> String {
    Category::KNOWN
        .iter()
        .filter(|c| c.is_fittable())
        .map(|c| c.code().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
