// Typed game actions and the uniform response shape returned for each of them.

use serde::{Deserialize, Serialize};

use super::garden::GardenBed;
use super::inventory::PlantInstance;
use crate::error::GameError;

/// Wire form of a game action. Accepts both the web client's camelCase keys and snake_case.
#[derive(Debug, Clone, Deserialize)]
pub struct GameActionRequest {
    pub user_id: String,
    pub action_type: String,
    #[serde(default, rename = "plantId", alias = "plant_id")]
    pub plant_id: Option<u32>,
    #[serde(default, rename = "bedId", alias = "bed_id")]
    pub bed_id: Option<u32>,
    /// Sent by the client for display only; the catalog price is authoritative.
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default, rename = "growTime", alias = "grow_time")]
    pub grow_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    BuyPlant,
    PlantSeed,
    Harvest,
    UnlockBed,
}

impl ActionKind {
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "buy_plant" => Some(ActionKind::BuyPlant),
            "plant_seed" => Some(ActionKind::PlantSeed),
            "harvest" => Some(ActionKind::Harvest),
            "unlock_bed" => Some(ActionKind::UnlockBed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::BuyPlant => "buy_plant",
            ActionKind::PlantSeed => "plant_seed",
            ActionKind::Harvest => "harvest",
            ActionKind::UnlockBed => "unlock_bed",
        }
    }
}

/// A validated action with exactly the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    BuyPlant {
        plant_id: u32,
    },
    PlantSeed {
        plant_id: u32,
        bed_id: u32,
        grow_time: Option<i64>,
    },
    Harvest {
        bed_id: u32,
    },
    UnlockBed {
        bed_id: u32,
        cost: Option<i64>,
    },
}

impl GameActionRequest {
    pub fn into_action(self) -> Result<GameAction, GameError> {
        let kind = ActionKind::from_str_name(&self.action_type).ok_or(GameError::InvalidAction)?;
        let plant_id = || self.plant_id.ok_or(GameError::MissingField("Plant ID"));
        let bed_id = || self.bed_id.ok_or(GameError::MissingField("Bed ID"));

        Ok(match kind {
            ActionKind::BuyPlant => GameAction::BuyPlant {
                plant_id: plant_id()?,
            },
            ActionKind::PlantSeed => GameAction::PlantSeed {
                plant_id: plant_id()?,
                bed_id: bed_id()?,
                grow_time: self.grow_time,
            },
            ActionKind::Harvest => GameAction::Harvest { bed_id: bed_id()? },
            ActionKind::UnlockBed => GameAction::UnlockBed {
                bed_id: bed_id()?,
                cost: self.cost,
            },
        })
    }
}

/// Hint telling the client which animation to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    BuySuccess,
    PlantSuccess,
    HarvestSuccess,
    UnlockSuccess,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameResponse {
    pub success: bool,
    pub message: String,
    pub animation_type: AnimationType,
    #[serde(rename = "coinsSpent", skip_serializing_if = "Option::is_none")]
    pub coins_spent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant: Option<PlantInstance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed: Option<GardenBed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_gained: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp_to_next_level: Option<i64>,
}

impl GameResponse {
    pub fn new(animation_type: AnimationType, message: String) -> Self {
        Self {
            success: true,
            message,
            animation_type,
            coins_spent: None,
            plant: None,
            bed: None,
            reward: None,
            experience_gained: None,
            new_level: None,
            current_exp: None,
            exp_to_next_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> GameActionRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_camel_case_fields() {
        let req = parse(json!({
            "user_id": "u1",
            "action_type": "plant_seed",
            "plantId": 2,
            "bedId": 1,
            "growTime": 45
        }));
        assert_eq!(
            req.into_action().unwrap(),
            GameAction::PlantSeed {
                plant_id: 2,
                bed_id: 1,
                grow_time: Some(45)
            }
        );
    }

    #[test]
    fn test_snake_case_aliases() {
        let req = parse(json!({
            "user_id": "u1",
            "action_type": "buy_plant",
            "plant_id": 3,
            "price": 200
        }));
        assert_eq!(req.into_action().unwrap(), GameAction::BuyPlant { plant_id: 3 });
    }

    #[test]
    fn test_unknown_action_type() {
        let req = parse(json!({"user_id": "u1", "action_type": "water"}));
        assert!(matches!(req.into_action(), Err(GameError::InvalidAction)));
    }

    #[test]
    fn test_missing_fields() {
        let req = parse(json!({"user_id": "u1", "action_type": "harvest"}));
        assert!(matches!(
            req.into_action(),
            Err(GameError::MissingField("Bed ID"))
        ));
        let req = parse(json!({"user_id": "u1", "action_type": "buy_plant"}));
        assert!(matches!(
            req.into_action(),
            Err(GameError::MissingField("Plant ID"))
        ));
    }

    #[test]
    fn test_unlock_cost_passed_through() {
        let req = parse(json!({"user_id": "u1", "action_type": "unlock_bed", "bedId": 2}));
        assert_eq!(
            req.into_action().unwrap(),
            GameAction::UnlockBed { bed_id: 2, cost: None }
        );
        let req = parse(json!({"user_id": "u1", "action_type": "unlock_bed", "bed_id": 3, "cost": 250}));
        assert_eq!(
            req.into_action().unwrap(),
            GameAction::UnlockBed { bed_id: 3, cost: Some(250) }
        );
    }

    #[test]
    fn test_action_kind_names() {
        for name in ["buy_plant", "plant_seed", "harvest", "unlock_bed"] {
            assert_eq!(ActionKind::from_str_name(name).unwrap().as_str(), name);
        }
        assert!(ActionKind::from_str_name("water").is_none());
    }

    #[test]
    fn test_response_omits_unset_fields() {
        let mut resp = GameResponse::new(AnimationType::BuySuccess, "You bought it!".into());
        resp.coins_spent = Some(100);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["animation_type"], "buy_success");
        assert_eq!(v["coinsSpent"], 100);
        assert!(v.get("reward").is_none());
    }
}
