// Static game tables: the plant catalog, level thresholds and garden constants.

use serde::Serialize;

/// Coins granted to every newly registered user.
pub const STARTING_COINS: i64 = 500;
pub const STARTING_LEVEL: u32 = 1;

/// Number of beds in every garden. Bed ids run from 1 to `BED_COUNT`.
pub const BED_COUNT: u32 = 6;
/// Beds with an id at or below this start unlocked.
pub const UNLOCKED_BEDS: u32 = 1;

/// Unlock price the web client sends, used when an unlock action omits `cost`.
pub const DEFAULT_UNLOCK_COST: i64 = 200;

/// Highest reachable level. Experience keeps accumulating here but never levels.
pub const MAX_LEVEL: u32 = 10;

/// A purchasable plant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantDefinition {
    pub id: u32,
    pub name: &'static str,
    pub price: i64,
    pub image: &'static str,
    /// Seconds from planting until the plant can be harvested.
    pub grow_time: i64,
    /// Coins credited on harvest.
    pub reward: i64,
    /// Experience credited on harvest.
    pub exp: i64,
}

pub static PLANTS: [PlantDefinition; 6] = [
    PlantDefinition {
        id: 1,
        name: "Magic Rose",
        price: 100,
        image: "/static/red_rose_magic_v2.png",
        grow_time: 30,
        reward: 1000,
        exp: 20,
    },
    PlantDefinition {
        id: 2,
        name: "Magic Mushroom",
        price: 150,
        image: "/static/mushroom_blue_magic.png",
        grow_time: 45,
        reward: 1500,
        exp: 35,
    },
    PlantDefinition {
        id: 3,
        name: "Moon Flower",
        price: 200,
        image: "/static/starlight_flower_v2.png",
        grow_time: 60,
        reward: 2000,
        exp: 50,
    },
    PlantDefinition {
        id: 4,
        name: "Giant Pumpkin",
        price: 250,
        image: "/static/garbus_image.png",
        grow_time: 75,
        reward: 2500,
        exp: 70,
    },
    PlantDefinition {
        id: 5,
        name: "Crystal Lily",
        price: 300,
        image: "/static/crystal_lily_v1.png",
        grow_time: 90,
        reward: 3000,
        exp: 90,
    },
    PlantDefinition {
        id: 6,
        name: "Dark Orchid",
        price: 350,
        image: "/static/moon_flower_v1.png",
        grow_time: 120,
        reward: 3500,
        exp: 120,
    },
];

// Experience needed at each level to advance to the next one [level 1..=10]
const LEVEL_EXP: [i64; MAX_LEVEL as usize] = [100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200, 4000];

/// The whole catalog, in id order.
pub fn list_plants() -> &'static [PlantDefinition] {
    &PLANTS
}

/// Look up a catalog entry by id.
pub fn find_plant(id: u32) -> Option<&'static PlantDefinition> {
    PLANTS.iter().find(|p| p.id == id)
}

/// Experience threshold for leaving `level`, or `None` past the table.
pub fn level_threshold(level: u32) -> Option<i64> {
    if level == 0 {
        return None;
    }
    LEVEL_EXP.get(level as usize - 1).copied()
}
