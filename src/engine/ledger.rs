// Account ledger: identity, coin balance and level progression for one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{STARTING_COINS, STARTING_LEVEL};
use super::leveling;
use crate::error::GameError;

const MIN_WALLET_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, or the raw password in plaintext mode.
    pub password: String,
    pub birth_date: String,
    pub wallet_address: String,
    pub telegram_id: Option<i64>,
    pub avatar: Option<String>,
    pub level: u32,
    pub coins: i64,
    pub experience: i64,
    pub created_at: DateTime<Utc>,
}

/// Registration input. `password` holds the raw password until the service
/// swaps in its stored form.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub birth_date: String,
    pub wallet_address: String,
    pub telegram_id: Option<i64>,
    pub avatar: Option<String>,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub birth_date: Option<String>,
    pub wallet_address: Option<String>,
    pub avatar: Option<String>,
}

/// At least 12 characters, all ASCII letters or digits.
pub fn validate_wallet(address: &str) -> bool {
    address.chars().count() >= MIN_WALLET_LEN && address.chars().all(|c| c.is_ascii_alphanumeric())
}

impl User {
    pub fn new(id: String, new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            birth_date: new_user.birth_date,
            wallet_address: new_user.wallet_address,
            telegram_id: new_user.telegram_id,
            avatar: new_user.avatar,
            level: STARTING_LEVEL,
            coins: STARTING_COINS,
            experience: 0,
            created_at: now,
        }
    }

    pub fn exp_to_next_level(&self) -> i64 {
        leveling::exp_to_next_level(self.level, self.experience)
    }

    /// Credit experience; returns whether the user levelled up.
    pub fn apply_experience(&mut self, gained: i64) -> bool {
        leveling::apply_experience(&mut self.level, &mut self.experience, gained)
    }

    pub fn apply_changes(&mut self, changes: ProfileChanges) -> Result<(), GameError> {
        if let Some(ref wallet) = changes.wallet_address {
            if !validate_wallet(wallet) {
                return Err(GameError::InvalidWallet);
            }
        }
        if let Some(username) = changes.username {
            self.username = username;
        }
        if let Some(password) = changes.password {
            self.password = password;
        }
        if let Some(birth_date) = changes.birth_date {
            self.birth_date = birth_date;
        }
        if let Some(wallet) = changes.wallet_address {
            self.wallet_address = wallet;
        }
        if let Some(avatar) = changes.avatar {
            self.avatar = Some(avatar);
        }
        Ok(())
    }
}

/// Registration checks against every existing account, in the order callers see them:
/// duplicate email, duplicate Telegram link, then wallet format.
pub fn check_registration<'a>(
    existing: impl IntoIterator<Item = &'a User>,
    email: &str,
    telegram_id: Option<i64>,
    wallet_address: &str,
) -> Result<(), GameError> {
    for user in existing {
        if user.email == email {
            return Err(GameError::DuplicateEmail);
        }
        if telegram_id.is_some() && user.telegram_id == telegram_id {
            return Err(GameError::DuplicateExternalAccount);
        }
    }
    if !validate_wallet(wallet_address) {
        return Err(GameError::InvalidWallet);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(email: &str, telegram_id: Option<i64>) -> User {
        User::new(
            format!("id-{email}"),
            NewUser {
                username: "gardener".into(),
                email: email.into(),
                password: "secret".into(),
                birth_date: "2000-01-01".into(),
                wallet_address: "abc123def456".into(),
                telegram_id,
                avatar: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_validate_wallet() {
        assert!(validate_wallet("abc123def456"));
        assert!(validate_wallet("ABCDEFGHIJKLMNOP0123"));
        assert!(!validate_wallet("short1"));
        assert!(!validate_wallet("has-dash-1234"));
        assert!(!validate_wallet("with space 12345"));
        assert!(!validate_wallet(""));
    }

    #[test]
    fn test_new_user_defaults() {
        let user = sample("a@example.com", None);
        assert_eq!(user.level, 1);
        assert_eq!(user.coins, 500);
        assert_eq!(user.experience, 0);
        assert_eq!(user.exp_to_next_level(), 100);
    }

    #[test]
    fn test_check_registration_duplicates() {
        let users = vec![sample("a@example.com", Some(77))];
        assert!(matches!(
            check_registration(&users, "a@example.com", None, "abc123def456"),
            Err(GameError::DuplicateEmail)
        ));
        assert!(matches!(
            check_registration(&users, "b@example.com", Some(77), "abc123def456"),
            Err(GameError::DuplicateExternalAccount)
        ));
        assert!(matches!(
            check_registration(&users, "b@example.com", Some(78), "bad"),
            Err(GameError::InvalidWallet)
        ));
        assert!(check_registration(&users, "b@example.com", None, "abc123def456").is_ok());
    }

    #[test]
    fn test_apply_changes_overwrites_provided_fields() {
        let mut user = sample("a@example.com", None);
        user.apply_changes(ProfileChanges {
            username: Some("renamed".into()),
            avatar: Some("/static/me.png".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(user.username, "renamed");
        assert_eq!(user.avatar.as_deref(), Some("/static/me.png"));
        assert_eq!(user.birth_date, "2000-01-01");
    }

    #[test]
    fn test_apply_changes_rejects_bad_wallet_atomically() {
        let mut user = sample("a@example.com", None);
        let err = user
            .apply_changes(ProfileChanges {
                username: Some("renamed".into()),
                wallet_address: Some("nope!".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidWallet));
        assert_eq!(user.username, "gardener");
        assert_eq!(user.wallet_address, "abc123def456");
    }

    #[test]
    fn test_user_apply_experience() {
        let mut user = sample("a@example.com", None);
        user.experience = 90;
        assert!(user.apply_experience(20));
        assert_eq!(user.level, 2);
        assert_eq!(user.experience, 10);
        assert_eq!(user.exp_to_next_level(), 240);
    }
}
