// Game service: owns the store and applies every operation against one player record.
//
// Mutations on a user run under that user's lock: load the record, apply the
// transition to the loaded copy, and write it back only if the transition
// succeeded. A failed action therefore leaves the stored record untouched, and
// concurrent actions on the same user are applied one at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;

use super::action::{ActionKind, AnimationType, GameAction, GameActionRequest, GameResponse};
use super::catalog::{self, PlantDefinition, DEFAULT_UNLOCK_COST};
use super::garden::{self, Garden, GardenBed};
use super::inventory::{self, Inventory, PlantInstance};
use super::ledger::{self, NewUser, ProfileChanges, User};
use crate::auth::PasswordMode;
use crate::db::{PlayerRecord, Store};
use crate::error::GameError;
use crate::metrics;

// ── Clock ────────────────────────────────────────────────────────────

/// Source of "now" for growth progress.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used to fast-forward growth.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Settings ─────────────────────────────────────────────────────────

/// Where a planted bed's grow duration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowTimePolicy {
    /// Always the planted instance's own `grow_time`.
    #[default]
    Catalog,
    /// A positive `growTime` from the caller wins; otherwise the instance's.
    Client,
}

#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub password_mode: PasswordMode,
    pub grow_time_policy: GrowTimePolicy,
    /// Charged when an unlock action omits `cost`.
    pub default_unlock_cost: i64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            password_mode: PasswordMode::default(),
            grow_time_policy: GrowTimePolicy::default(),
            default_unlock_cost: DEFAULT_UNLOCK_COST,
        }
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────

/// Result of a successful harvest.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub plant: PlantInstance,
    pub bed: GardenBed,
    pub leveled_up: bool,
    pub level: u32,
    pub experience: i64,
    pub exp_to_next_level: i64,
}

// ── Service ──────────────────────────────────────────────────────────

pub struct GameService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    settings: GameSettings,
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    /// Serializes registrations so uniqueness checks and the insert are atomic.
    registry: AsyncMutex<()>,
}

impl<S: Store> GameService<S> {
    pub fn new(store: S, settings: GameSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, settings: GameSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            settings,
            user_locks: Mutex::new(HashMap::new()),
            registry: AsyncMutex::new(()),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    fn user_lock(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn load(&self, user_id: &str) -> Result<PlayerRecord, GameError> {
        self.store
            .get(user_id)
            .await?
            .ok_or(GameError::UserNotFound)
    }

    /// Run `apply` against the user's record under their lock, persisting only on success.
    async fn mutate<T>(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut PlayerRecord, DateTime<Utc>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        // Records are never deleted, so an existence check up front keeps
        // unknown ids out of the lock table.
        self.load(user_id).await?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut record = self.load(user_id).await?;
        let out = apply(&mut record, self.clock.now())?;
        self.store.put(&record).await?;
        Ok(out)
    }

    // ── Accounts ─────────────────────────────────────────────────────

    pub async fn register(&self, new_user: NewUser) -> Result<User, GameError> {
        let _guard = self.registry.lock().await;

        let existing = self.store.list().await?;
        let checked = ledger::check_registration(
            existing.iter().map(|r| &r.user),
            &new_user.email,
            new_user.telegram_id,
            &new_user.wallet_address,
        );
        if let Err(e) = checked {
            metrics::REGISTRATIONS_TOTAL
                .with_label_values(&[e.kind()])
                .inc();
            return Err(e);
        }

        let password = self
            .settings
            .password_mode
            .store(&new_user.password)
            .map_err(GameError::Internal)?;
        let id = uuid::Uuid::new_v4().to_string();
        let user = User::new(
            id,
            NewUser {
                password,
                ..new_user
            },
            self.clock.now(),
        );

        self.store.put(&PlayerRecord::new(user.clone())).await?;
        metrics::REGISTRATIONS_TOTAL.with_label_values(&["ok"]).inc();
        tracing::info!(user_id = %user.id, "New user registered");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, GameError> {
        let records = self.store.list().await?;
        let Some(record) = records.into_iter().find(|r| r.user.email == email) else {
            metrics::LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(GameError::InvalidCredentials);
        };

        // A stored password the active mode cannot parse (say, a plaintext record
        // read in Argon2 mode) is a failed login, not a server fault.
        let ok = match self
            .settings
            .password_mode
            .verify(password, &record.user.password)
        {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(user_id = %record.user.id, "Unverifiable stored password: {e}");
                false
            }
        };
        if !ok {
            metrics::LOGINS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(GameError::InvalidCredentials);
        }
        metrics::LOGINS_TOTAL.with_label_values(&["ok"]).inc();
        Ok(record.user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, GameError> {
        Ok(self.load(user_id).await?.user)
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        mut changes: ProfileChanges,
    ) -> Result<User, GameError> {
        if let Some(password) = changes.password.take() {
            changes.password = Some(
                self.settings
                    .password_mode
                    .store(&password)
                    .map_err(GameError::Internal)?,
            );
        }
        self.mutate(user_id, |record, _| {
            record.user.apply_changes(changes)?;
            Ok(record.user.clone())
        })
        .await
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn list_plants(&self) -> &'static [PlantDefinition] {
        catalog::list_plants()
    }

    /// The user's garden with progress recomputed for the current instant.
    pub async fn get_garden(&self, user_id: &str) -> Result<Garden, GameError> {
        let mut garden = self.load(user_id).await?.garden;
        garden.refresh(self.clock.now());
        Ok(garden)
    }

    pub async fn get_inventory(&self, user_id: &str) -> Result<Inventory, GameError> {
        Ok(self.load(user_id).await?.inventory)
    }

    // ── Game actions ─────────────────────────────────────────────────

    pub async fn buy_plant(&self, user_id: &str, plant_id: u32) -> Result<PlantInstance, GameError> {
        let plant = self
            .mutate(user_id, |record, _| {
                inventory::buy_plant(&mut record.user.coins, &mut record.inventory, plant_id)
            })
            .await?;
        metrics::COINS_SPENT_TOTAL.inc_by(plant.price as u64);
        Ok(plant)
    }

    pub async fn plant_seed(
        &self,
        user_id: &str,
        plant_id: u32,
        bed_id: u32,
        requested_grow_time: Option<i64>,
    ) -> Result<GardenBed, GameError> {
        let policy = self.settings.grow_time_policy;
        self.mutate(user_id, |record, now| {
            let catalog_grow_time = record
                .inventory
                .items()
                .iter()
                .find(|p| p.id == plant_id)
                .map(|p| p.grow_time)
                .ok_or(GameError::ItemNotInInventory)?;
            let grow_time = resolve_grow_time(policy, catalog_grow_time, requested_grow_time);
            garden::plant_seed(
                &mut record.inventory,
                &mut record.garden,
                plant_id,
                bed_id,
                grow_time,
                now,
            )
        })
        .await
    }

    pub async fn harvest(&self, user_id: &str, bed_id: u32) -> Result<HarvestOutcome, GameError> {
        let outcome = self
            .mutate(user_id, |record, now| {
                let (plant, bed) = garden::harvest(&mut record.garden, bed_id, now)?;
                let user = &mut record.user;
                user.coins += plant.reward;
                let leveled_up = user.apply_experience(plant.exp);
                Ok(HarvestOutcome {
                    leveled_up,
                    level: user.level,
                    experience: user.experience,
                    exp_to_next_level: user.exp_to_next_level(),
                    plant,
                    bed,
                })
            })
            .await?;
        metrics::HARVESTS_TOTAL.inc();
        metrics::COINS_EARNED_TOTAL.inc_by(outcome.plant.reward as u64);
        if outcome.leveled_up {
            tracing::info!(user_id, level = outcome.level, "User levelled up");
        }
        Ok(outcome)
    }

    /// Unlock a bed. Returns the bed and the price actually charged.
    pub async fn unlock_bed(
        &self,
        user_id: &str,
        bed_id: u32,
        cost: Option<i64>,
    ) -> Result<(GardenBed, i64), GameError> {
        let cost = cost.unwrap_or(self.settings.default_unlock_cost);
        let bed = self
            .mutate(user_id, |record, _| {
                garden::unlock_bed(&mut record.user.coins, &mut record.garden, bed_id, cost)
            })
            .await?;
        metrics::COINS_SPENT_TOTAL.inc_by(cost as u64);
        Ok((bed, cost))
    }

    /// Single entry point for the four game actions.
    pub async fn dispatch(&self, request: GameActionRequest) -> Result<GameResponse, GameError> {
        let user_id = request.user_id.clone();
        let action = ActionKind::from_str_name(&request.action_type).map_or("unknown", ActionKind::as_str);
        tracing::info!(user_id = %user_id, action, "Received game action");

        let result = self.dispatch_inner(&user_id, request).await;
        match &result {
            Ok(_) => metrics::GAME_ACTIONS_TOTAL
                .with_label_values(&[action, "ok"])
                .inc(),
            Err(e) => {
                tracing::info!(user_id = %user_id, action, error = e.kind(), "Game action rejected");
                metrics::GAME_ACTIONS_TOTAL
                    .with_label_values(&[action, e.kind()])
                    .inc();
            }
        }
        result
    }

    async fn dispatch_inner(
        &self,
        user_id: &str,
        request: GameActionRequest,
    ) -> Result<GameResponse, GameError> {
        // The user is resolved before the action itself is validated.
        self.load(user_id).await?;
        let action = request.into_action()?;

        let response = match action {
            GameAction::BuyPlant { plant_id } => {
                let plant = self.buy_plant(user_id, plant_id).await?;
                let mut resp =
                    GameResponse::new(AnimationType::BuySuccess, format!("You bought {}!", plant.name));
                resp.coins_spent = Some(plant.price);
                resp.plant = Some(plant);
                resp
            }
            GameAction::PlantSeed {
                plant_id,
                bed_id,
                grow_time,
            } => {
                let bed = self.plant_seed(user_id, plant_id, bed_id, grow_time).await?;
                let name = bed.plant.as_ref().map(|p| p.name.clone()).unwrap_or_default();
                let mut resp =
                    GameResponse::new(AnimationType::PlantSuccess, format!("You planted {name}!"));
                resp.bed = Some(bed);
                resp
            }
            GameAction::Harvest { bed_id } => {
                let outcome = self.harvest(user_id, bed_id).await?;
                let mut resp = GameResponse::new(
                    AnimationType::HarvestSuccess,
                    format!(
                        "You harvested {} and earned {} coins and {} exp!",
                        outcome.plant.name, outcome.plant.reward, outcome.plant.exp
                    ),
                );
                resp.reward = Some(outcome.plant.reward);
                resp.experience_gained = Some(outcome.plant.exp);
                resp.new_level = outcome.leveled_up.then_some(outcome.level);
                resp.current_exp = Some(outcome.experience);
                resp.exp_to_next_level = Some(outcome.exp_to_next_level);
                resp.bed = Some(outcome.bed);
                resp
            }
            GameAction::UnlockBed { bed_id, cost } => {
                let (bed, charged) = self.unlock_bed(user_id, bed_id, cost).await?;
                let mut resp =
                    GameResponse::new(AnimationType::UnlockSuccess, "Garden bed unlocked!".into());
                resp.coins_spent = Some(charged);
                resp.bed = Some(bed);
                resp
            }
        };
        Ok(response)
    }
}

fn resolve_grow_time(policy: GrowTimePolicy, catalog: i64, requested: Option<i64>) -> i64 {
    match (policy, requested) {
        (GrowTimePolicy::Client, Some(secs)) if secs > 0 => secs,
        (GrowTimePolicy::Catalog, Some(secs)) if secs != catalog => {
            tracing::debug!(requested = secs, catalog, "Ignoring client grow time");
            catalog
        }
        _ => catalog,
    }
}
