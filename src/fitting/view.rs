use serde::Serialize;

use super::{CanonicalFitting, Rack, SlotEntry};
use crate::catalog::{Catalog, TypeId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedItem {
    pub id: TypeId,
    pub name: String,
}

impl NamedItem {
    pub fn new(catalog: &Catalog, id: TypeId) -> Self {
        Self {
            id,
            name: catalog.name(id).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlotView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<TypeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<NamedItem>,
}

impl SlotView {
    fn new(catalog: &Catalog, entry: &SlotEntry) -> Self {
        Self {
            id: entry.item,
            name: entry.item.map(|id| catalog.name(id).to_string()),
            charge: entry.charge.map(|id| NamedItem::new(catalog, id)),
        }
    }
}

/// A stored fitting with names filled in from the catalog, for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittingView {
    pub id: i64,
    pub cost: i64,
    pub ship: NamedItem,
    pub high: Vec<SlotView>,
    pub medium: Vec<SlotView>,
    pub low: Vec<SlotView>,
    pub rig: Vec<SlotView>,
    pub subsystem: Vec<SlotView>,
    /// Charges found anywhere in the fitting
    pub charges: Vec<NamedItem>,
}

fn rack_view(catalog: &Catalog, rack: &Rack) -> Vec<SlotView> {
    rack.iter().map(|entry| SlotView::new(catalog, entry)).collect()
}

impl CanonicalFitting {
    pub fn hydrate(&self, catalog: &Catalog) -> FittingView {
        FittingView {
            id: self.id,
            cost: self.cost,
            ship: NamedItem::new(catalog, self.ship),
            high: rack_view(catalog, &self.high),
            medium: rack_view(catalog, &self.medium),
            low: rack_view(catalog, &self.low),
            rig: rack_view(catalog, &self.rig),
            subsystem: rack_view(catalog, &self.subsystem),
            charges: self
                .query_items
                .iter()
                .filter(|&&id| catalog.is_charge(id))
                .map(|&id| NamedItem::new(catalog, id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogGroup, CatalogItem, Category};
    use crate::fitting::SLOTS_PER_RACK;

    #[test]
    fn test_hydrate_names_and_charges() {
        let catalog = Catalog::new(
            [
                CatalogItem::new(587, "Rifter", 25),
                CatalogItem::new(2873, "200mm AutoCannon II", 55),
                CatalogItem::new(179, "Fusion S", 83),
            ],
            [
                CatalogGroup::new(25, "Frigate", Category::Ship),
                CatalogGroup::new(55, "Projectile Weapon", Category::Module),
                CatalogGroup::new(83, "Projectile Ammo", Category::Charge),
            ],
        );
        let mut fitting = CanonicalFitting::new(7, 1000, 587);
        fitting.high[2] = SlotEntry {
            item: Some(2873),
            charge: Some(179),
        };
        fitting.query_items = vec![179, 587, 2873];

        let view = fitting.hydrate(&catalog);
        assert_eq!(view.ship.name, "Rifter");
        assert_eq!(view.high.len(), SLOTS_PER_RACK);
        assert_eq!(view.high[2].name.as_deref(), Some("200mm AutoCannon II"));
        assert_eq!(view.high[2].charge.as_ref().map(|c| c.name.as_str()), Some("Fusion S"));
        assert_eq!(view.high[0], SlotView::default());
        assert_eq!(view.charges, vec![NamedItem::new(&catalog, 179)]);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["high"][0], serde_json::json!({}));
    }
}
