//! Canonical, slot-indexed fittings extracted from killmails

mod extract;
mod view;

pub use extract::{extract, Rejection};
pub use view::{FittingView, NamedItem, SlotView};

use serde::{Deserialize, Serialize};

use crate::catalog::TypeId;
use crate::parser::Flag;

/// Every slot rack has this many positions
pub const SLOTS_PER_RACK: usize = 8;

pub type Rack = [SlotEntry; SLOTS_PER_RACK];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Low,
    Medium,
    High,
    Rig,
    Subsystem,
}

impl SlotKind {
    pub const ALL: [SlotKind; 5] = [
        SlotKind::Low,
        SlotKind::Medium,
        SlotKind::High,
        SlotKind::Rig,
        SlotKind::Subsystem,
    ];

    /// First flag of this rack's range
    pub const fn range_start(&self) -> Flag {
        match self {
            SlotKind::Low => 11,
            SlotKind::Medium => 19,
            SlotKind::High => 27,
            SlotKind::Rig => 92,
            SlotKind::Subsystem => 125,
        }
    }

    /// Map an equipment flag to its rack and position, if it is a fitted slot
    pub fn from_flag(flag: Flag) -> Option<(SlotKind, usize)> {
        Self::ALL.into_iter().find_map(|kind| {
            let offset = flag.checked_sub(kind.range_start())?;
            usize::try_from(offset)
                .ok()
                .filter(|&idx| idx < SLOTS_PER_RACK)
                .map(|idx| (kind, idx))
        })
    }
}

/// A fitted position: the module in it, the charge loaded, or nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<TypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<TypeId>,
}

impl SlotEntry {
    pub fn is_empty(&self) -> bool {
        self.item.is_none() && self.charge.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFitting {
    pub id: i64,
    pub cost: i64,
    pub ship: TypeId,
    pub low: Rack,
    pub medium: Rack,
    pub high: Rack,
    pub rig: Rack,
    pub subsystem: Rack,
    /// Ship plus every item that landed in a slot, ascending and distinct
    pub query_items: Vec<TypeId>,
}

impl CanonicalFitting {
    pub fn new(id: i64, cost: i64, ship: TypeId) -> Self {
        Self {
            id,
            cost,
            ship,
            low: Rack::default(),
            medium: Rack::default(),
            high: Rack::default(),
            rig: Rack::default(),
            subsystem: Rack::default(),
            query_items: Vec::new(),
        }
    }

    pub fn rack_mut(&mut self, kind: SlotKind) -> &mut Rack {
        match kind {
            SlotKind::Low => &mut self.low,
            SlotKind::Medium => &mut self.medium,
            SlotKind::High => &mut self.high,
            SlotKind::Rig => &mut self.rig,
            SlotKind::Subsystem => &mut self.subsystem,
        }
    }
}
