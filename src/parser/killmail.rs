use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::TypeId;

/// Equipment flag of a victim item
pub type Flag = i32;

/// One entry of the victim's item list
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VictimItem {
    pub flag: Flag,
    pub item_type_id: TypeId,
}

/// The fields of a zkillboard package that fitting extraction consumes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawKillmail {
    #[serde(rename = "killID")]
    pub kill_id: i64,
    pub killmail: KillmailBody,
    #[serde(default)]
    pub zkb: Zkb,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KillmailBody {
    pub victim: Victim,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Victim {
    pub ship_type_id: TypeId,
    #[serde(default)]
    pub items: Vec<VictimItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Zkb {
    #[serde(rename = "fittedValue", default)]
    pub fitted_value: f64,
}

impl RawKillmail {
    /// Parse a single JSON package
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to parse killmail JSON")
    }

    pub fn ship_type_id(&self) -> TypeId {
        self.killmail.victim.ship_type_id
    }

    pub fn items(&self) -> &[VictimItem] {
        &self.killmail.victim.items
    }

    /// Fitted value truncated to whole ISK
    pub fn cost(&self) -> i64 {
        self.zkb.fitted_value as i64
    }
}
