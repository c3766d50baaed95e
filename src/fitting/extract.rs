use std::collections::BTreeSet;
use thiserror::Error;

use super::{CanonicalFitting, SlotKind};
use crate::catalog::{Catalog, TypeId};
use crate::parser::RawKillmail;

/// Why a killmail did not produce a fitting
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("ship type {0} is not in the catalog")]
    UnresolvedHull(TypeId),
    #[error("no known module in a low slot")]
    IncompleteFitting,
    #[error("charge type {0} vanished from the catalog")]
    UnresolvedCharge(TypeId),
}

impl Rejection {
    /// Short label used when tallying rejections
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::UnresolvedHull(_) => "unresolved hull",
            Rejection::IncompleteFitting => "incomplete fitting",
            Rejection::UnresolvedCharge(_) => "unresolved charge",
        }
    }
}

/// Build the canonical fitting for a killmail.
///
/// Victim items with flags outside the fitted ranges, or whose type or group
/// is unknown, are dropped silently. The whole record is rejected only when
/// the hull is unknown or no known item sits in a low slot.
pub fn extract(catalog: &Catalog, killmail: &RawKillmail) -> Result<CanonicalFitting, Rejection> {
    let ship = killmail.ship_type_id();
    if catalog.item(ship).is_none() {
        return Err(Rejection::UnresolvedHull(ship));
    }

    let mut fitting = CanonicalFitting::new(killmail.kill_id, killmail.cost(), ship);
    let mut query_items = BTreeSet::from([ship]);
    let mut has_low = false;

    for victim_item in killmail.items() {
        let Some((kind, idx)) = SlotKind::from_flag(victim_item.flag) else {
            continue;
        };
        let Some(item) = catalog.item(victim_item.item_type_id) else {
            continue;
        };
        let Some(group) = catalog.group(item.group_id) else {
            continue;
        };

        let slot = &mut fitting.rack_mut(kind)[idx];
        if group.is_charge() {
            // Always resolves: `item` came from the same catalog.
            if catalog.item(item.id).is_none() {
                return Err(Rejection::UnresolvedCharge(item.id));
            }
            slot.charge = Some(item.id);
        } else {
            slot.item = Some(item.id);
        }

        if kind == SlotKind::Low {
            has_low = true;
        }
        query_items.insert(victim_item.item_type_id);
    }

    if !has_low {
        return Err(Rejection::IncompleteFitting);
    }

    fitting.query_items = query_items.into_iter().collect();
    Ok(fitting)
}
