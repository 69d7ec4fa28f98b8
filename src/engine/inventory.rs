// Owned plant instances and the per-user inventory bag.

use serde::{Deserialize, Serialize};

use super::catalog::{self, PlantDefinition};
use crate::error::GameError;

/// A purchased copy of a catalog entry. Owned independently of the catalog,
/// so later catalog changes never touch plants a user already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantInstance {
    pub id: u32,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub grow_time: i64,
    pub reward: i64,
    pub exp: i64,
}

impl From<&PlantDefinition> for PlantInstance {
    fn from(def: &PlantDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name.to_string(),
            price: def.price,
            image: def.image.to_string(),
            grow_time: def.grow_time,
            reward: def.reward,
            exp: def.exp,
        }
    }
}

/// Unordered bag of purchased, unplanted plants. Duplicates never stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<PlantInstance>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PlantInstance] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, plant: PlantInstance) {
        self.items.push(plant);
    }

    /// Whether any held instance has the given plant id.
    pub fn contains(&self, plant_id: u32) -> bool {
        self.items.iter().any(|p| p.id == plant_id)
    }

    /// Remove and return the first instance with `plant_id`.
    /// Copies of the same plant are interchangeable, so which one goes is irrelevant.
    pub fn take(&mut self, plant_id: u32) -> Option<PlantInstance> {
        let index = self.items.iter().position(|p| p.id == plant_id)?;
        Some(self.items.remove(index))
    }
}

/// Buy one copy of `plant_id`, paying from `coins`.
///
/// Nothing is mutated unless the plant exists and the balance covers the price.
pub fn buy_plant(
    coins: &mut i64,
    inventory: &mut Inventory,
    plant_id: u32,
) -> Result<PlantInstance, GameError> {
    let def = catalog::find_plant(plant_id).ok_or_else(|| GameError::PlantNotFound {
        available: catalog::list_plants().iter().map(|p| p.id).collect(),
    })?;

    if *coins < def.price {
        return Err(GameError::InsufficientFunds);
    }

    let instance = PlantInstance::from(def);
    *coins -= def.price;
    inventory.push(instance.clone());
    Ok(instance)
}
