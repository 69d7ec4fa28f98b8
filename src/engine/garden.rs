// Garden beds and their state machine: Locked -> Empty -> Growing -> Ready -> Empty.
//
// Nothing here runs on a timer. Progress is derived from wall-clock time on
// every read, so a bed becomes Ready simply by time passing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{BED_COUNT, UNLOCKED_BEDS};
use super::inventory::{Inventory, PlantInstance};
use crate::error::GameError;

/// Observable state of a single bed at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BedState {
    Locked,
    Empty,
    Growing,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenBed {
    pub id: u32,
    pub plant: Option<PlantInstance>,
    /// Last computed progress, 0..=100. Refreshed on read and at harvest.
    pub progress: u8,
    pub is_locked: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub grow_time: Option<i64>,
}

impl GardenBed {
    fn new(id: u32) -> Self {
        Self {
            id,
            plant: None,
            progress: 0,
            is_locked: id > UNLOCKED_BEDS,
            start_time: None,
            grow_time: None,
        }
    }

    pub fn progress_at(&self, now: DateTime<Utc>) -> u8 {
        if self.plant.is_none() {
            return 0;
        }
        match self.start_time {
            Some(start) => calculate_progress(start, self.grow_time, now),
            None => 0,
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> BedState {
        if self.is_locked {
            BedState::Locked
        } else if self.plant.is_none() {
            BedState::Empty
        } else if self.progress_at(now) >= 100 {
            BedState::Ready
        } else {
            BedState::Growing
        }
    }

    pub fn refresh_progress(&mut self, now: DateTime<Utc>) {
        self.progress = self.progress_at(now);
    }

    fn clear(&mut self) {
        self.plant = None;
        self.start_time = None;
        self.grow_time = None;
        self.progress = 0;
    }
}

/// Percentage of `grow_time` seconds elapsed since `start`, floored and clamped to 0..=100.
/// A missing or non-positive duration yields 0.
pub fn calculate_progress(start: DateTime<Utc>, grow_time: Option<i64>, now: DateTime<Utc>) -> u8 {
    let grow_time = match grow_time {
        Some(secs) if secs > 0 => secs,
        _ => return 0,
    };
    let elapsed_ms = (now - start).num_milliseconds().max(0);
    let pct = elapsed_ms.saturating_mul(100) / grow_time.saturating_mul(1000);
    pct.clamp(0, 100) as u8
}

/// A user's fixed set of beds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garden {
    pub beds: Vec<GardenBed>,
}

impl Default for Garden {
    fn default() -> Self {
        Self::new()
    }
}

impl Garden {
    /// Fresh garden: bed 1 unlocked, the rest locked, all empty.
    pub fn new() -> Self {
        Self {
            beds: (1..=BED_COUNT).map(GardenBed::new).collect(),
        }
    }

    pub fn bed(&self, bed_id: u32) -> Option<&GardenBed> {
        self.beds.iter().find(|b| b.id == bed_id)
    }

    fn bed_mut(&mut self, bed_id: u32) -> Option<&mut GardenBed> {
        self.beds.iter_mut().find(|b| b.id == bed_id)
    }

    /// Recompute stored progress for every planted bed.
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        for bed in &mut self.beds {
            if bed.plant.is_some() {
                bed.refresh_progress(now);
            }
        }
    }
}

/// Locked -> Empty, paying `cost` from `coins`. A negative cost is rejected.
pub fn unlock_bed(
    coins: &mut i64,
    garden: &mut Garden,
    bed_id: u32,
    cost: i64,
) -> Result<GardenBed, GameError> {
    if cost < 0 {
        return Err(GameError::InvalidAction);
    }
    if *coins < cost {
        return Err(GameError::InsufficientFunds);
    }
    let bed = garden.bed_mut(bed_id).ok_or(GameError::BedNotFound)?;
    if !bed.is_locked {
        return Err(GameError::AlreadyUnlocked);
    }

    *coins -= cost;
    bed.is_locked = false;
    Ok(bed.clone())
}

/// Empty -> Growing. Moves one `plant_id` instance out of the inventory into the bed.
///
/// Every check runs before the inventory is touched, so a rejected plant is never consumed.
pub fn plant_seed(
    inventory: &mut Inventory,
    garden: &mut Garden,
    plant_id: u32,
    bed_id: u32,
    grow_time: i64,
    now: DateTime<Utc>,
) -> Result<GardenBed, GameError> {
    if !inventory.contains(plant_id) {
        return Err(GameError::ItemNotInInventory);
    }
    let bed = garden.bed_mut(bed_id).ok_or(GameError::BedNotFound)?;
    if bed.is_locked {
        return Err(GameError::BedLocked);
    }
    if bed.plant.is_some() {
        return Err(GameError::BedOccupied);
    }

    let plant = inventory.take(plant_id).ok_or(GameError::ItemNotInInventory)?;
    bed.plant = Some(plant);
    bed.start_time = Some(now);
    bed.grow_time = Some(grow_time);
    bed.progress = 0;
    Ok(bed.clone())
}

/// Growing/Ready -> Empty. Returns the harvested plant and the cleared bed.
pub fn harvest(
    garden: &mut Garden,
    bed_id: u32,
    now: DateTime<Utc>,
) -> Result<(PlantInstance, GardenBed), GameError> {
    let bed = match garden.bed_mut(bed_id) {
        Some(bed) if bed.plant.is_some() => bed,
        _ => return Err(GameError::NothingToHarvest),
    };
    if bed.progress_at(now) < 100 {
        return Err(GameError::NotReady);
    }

    let plant = bed.plant.take().ok_or(GameError::NothingToHarvest)?;
    bed.clear();
    Ok((plant, bed.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn inventory_with(ids: &[u32]) -> Inventory {
        let mut inv = Inventory::new();
        for id in ids {
            inv.push(PlantInstance::from(catalog::find_plant(*id).unwrap()));
        }
        inv
    }

    #[test]
    fn test_new_garden_layout() {
        let garden = Garden::new();
        assert_eq!(garden.beds.len(), 6);
        assert!(!garden.bed(1).unwrap().is_locked);
        for id in 2..=6 {
            assert!(garden.bed(id).unwrap().is_locked);
        }
        assert_eq!(garden.bed(1).unwrap().state_at(t0()), BedState::Empty);
        assert_eq!(garden.bed(2).unwrap().state_at(t0()), BedState::Locked);
    }

    #[test]
    fn test_progress_computation() {
        let start = t0();
        assert_eq!(calculate_progress(start, Some(30), start), 0);
        assert_eq!(calculate_progress(start, Some(30), start + Duration::seconds(15)), 50);
        assert_eq!(
            calculate_progress(start, Some(30), start + Duration::milliseconds(29_999)),
            99
        );
        assert_eq!(calculate_progress(start, Some(30), start + Duration::seconds(30)), 100);
        assert_eq!(calculate_progress(start, Some(30), start + Duration::hours(5)), 100);
    }

    #[test]
    fn test_progress_degenerate_inputs() {
        let start = t0();
        assert_eq!(calculate_progress(start, None, start + Duration::seconds(60)), 0);
        assert_eq!(calculate_progress(start, Some(0), start + Duration::seconds(60)), 0);
        assert_eq!(calculate_progress(start, Some(-5), start + Duration::seconds(60)), 0);
        // Clock going backwards clamps to zero.
        assert_eq!(calculate_progress(start, Some(30), start - Duration::seconds(10)), 0);
    }

    #[test]
    fn test_unlock_bed() {
        let mut coins = 500;
        let mut garden = Garden::new();
        let bed = unlock_bed(&mut coins, &mut garden, 2, 200).unwrap();
        assert!(!bed.is_locked);
        assert_eq!(coins, 300);
        assert!(!garden.bed(2).unwrap().is_locked);
    }

    #[test]
    fn test_unlock_insufficient_funds_unchanged() {
        let mut coins = 150;
        let mut garden = Garden::new();
        let err = unlock_bed(&mut coins, &mut garden, 2, 200).unwrap_err();
        assert!(matches!(err, GameError::InsufficientFunds));
        assert_eq!(coins, 150);
        assert!(garden.bed(2).unwrap().is_locked);
    }

    #[test]
    fn test_unlock_negative_cost_rejected() {
        let mut coins = 500;
        let mut garden = Garden::new();
        let err = unlock_bed(&mut coins, &mut garden, 2, -1000).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction));
        assert_eq!(coins, 500);
        assert!(garden.bed(2).unwrap().is_locked);
    }

    #[test]
    fn test_unlock_errors() {
        let mut coins = 500;
        let mut garden = Garden::new();
        assert!(matches!(
            unlock_bed(&mut coins, &mut garden, 9, 100),
            Err(GameError::BedNotFound)
        ));
        assert!(matches!(
            unlock_bed(&mut coins, &mut garden, 1, 100),
            Err(GameError::AlreadyUnlocked)
        ));
        assert_eq!(coins, 500);
    }

    #[test]
    fn test_plant_seed_moves_instance_into_bed() {
        let mut inv = inventory_with(&[1, 1]);
        let mut garden = Garden::new();
        let bed = plant_seed(&mut inv, &mut garden, 1, 1, 30, t0()).unwrap();
        assert_eq!(inv.len(), 1);
        assert_eq!(bed.plant.as_ref().unwrap().id, 1);
        assert_eq!(bed.start_time, Some(t0()));
        assert_eq!(bed.grow_time, Some(30));
        assert_eq!(bed.state_at(t0()), BedState::Growing);
        assert_eq!(bed.state_at(t0() + Duration::seconds(30)), BedState::Ready);
    }

    #[test]
    fn test_plant_seed_failures_do_not_consume() {
        let mut inv = inventory_with(&[1]);
        let mut garden = Garden::new();

        assert!(matches!(
            plant_seed(&mut inv, &mut garden, 2, 1, 30, t0()),
            Err(GameError::ItemNotInInventory)
        ));
        assert!(matches!(
            plant_seed(&mut inv, &mut garden, 1, 7, 30, t0()),
            Err(GameError::BedNotFound)
        ));
        assert!(matches!(
            plant_seed(&mut inv, &mut garden, 1, 2, 30, t0()),
            Err(GameError::BedLocked)
        ));
        assert_eq!(inv.len(), 1);

        let mut other = inventory_with(&[3]);
        plant_seed(&mut other, &mut garden, 3, 1, 60, t0()).unwrap();
        assert!(matches!(
            plant_seed(&mut inv, &mut garden, 1, 1, 30, t0()),
            Err(GameError::BedOccupied)
        ));
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn test_harvest_lifecycle() {
        let mut inv = inventory_with(&[1]);
        let mut garden = Garden::new();
        plant_seed(&mut inv, &mut garden, 1, 1, 30, t0()).unwrap();

        assert!(matches!(
            harvest(&mut garden, 1, t0() + Duration::seconds(10)),
            Err(GameError::NotReady)
        ));

        let (plant, bed) = harvest(&mut garden, 1, t0() + Duration::seconds(31)).unwrap();
        assert_eq!(plant.reward, 1000);
        assert!(bed.plant.is_none());
        assert!(bed.start_time.is_none());
        assert!(bed.grow_time.is_none());
        assert_eq!(bed.progress, 0);
        assert_eq!(bed.state_at(t0()), BedState::Empty);

        assert!(matches!(
            harvest(&mut garden, 1, t0() + Duration::seconds(40)),
            Err(GameError::NothingToHarvest)
        ));
    }

    #[test]
    fn test_harvest_unknown_bed_is_nothing_to_harvest() {
        let mut garden = Garden::new();
        assert!(matches!(
            harvest(&mut garden, 99, t0()),
            Err(GameError::NothingToHarvest)
        ));
    }

    #[test]
    fn test_refresh_updates_only_planted_beds() {
        let mut inv = inventory_with(&[3]);
        let mut garden = Garden::new();
        plant_seed(&mut inv, &mut garden, 3, 1, 60, t0()).unwrap();
        garden.refresh(t0() + Duration::seconds(30));
        assert_eq!(garden.bed(1).unwrap().progress, 50);
        assert_eq!(garden.bed(2).unwrap().progress, 0);
    }
}
