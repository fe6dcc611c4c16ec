//! Session handling
//!
//! [`SessionStore`] is the seam between the rest of the application and
//! whoever knows about accounts. [`MockSessionStore`] is the only provider:
//! it keeps a small in-memory account directory seeded with a demo user and
//! remembers the logged-in user in an injected [`SessionStorage`].

pub mod storage;

use tracing::{error, info, warn};

use crate::models::{ProfileUpdate, User};
use crate::{EcoRideError, Result};

pub use storage::{MemoryStorage, PersistentStorage, SessionStorage};

/// Storage key holding the logged-in user as JSON
pub const CURRENT_USER_KEY: &str = "ecoride_user";

pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_PASSWORD: &str = "password123";

pub trait SessionStore {
    fn login(&mut self, email: &str, password: &str) -> Result<User>;
    fn register(&mut self, name: &str, email: &str, password: &str) -> Result<User>;
    fn logout(&mut self) -> Result<()>;
    fn current_user(&self) -> Option<User>;
    fn update_profile(&mut self, update: ProfileUpdate) -> Result<User>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// Name and email rules shared by registration and profile edits
fn validate_identity(name: &str, email: &str) -> Result<()> {
    if name.is_empty() || email.is_empty() {
        return Err(EcoRideError::validation("Name and email are required"));
    }
    if !email.contains('@') {
        return Err(EcoRideError::validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

struct Account {
    user: User,
    password: String,
}

/// Session store backed by a fixed, in-memory account directory
pub struct MockSessionStore<S: SessionStorage> {
    accounts: Vec<Account>,
    current: Option<User>,
    storage: S,
}

impl<S: SessionStorage> MockSessionStore<S> {
    /// Create a store with the demo account, restoring any saved session from `storage`
    pub fn new(storage: S) -> Self {
        let mut store = Self {
            accounts: vec![Account {
                user: User {
                    id: "1".to_string(),
                    email: DEMO_EMAIL.to_string(),
                    name: "Demo User".to_string(),
                    profile_picture: None,
                },
                password: DEMO_PASSWORD.to_string(),
            }],
            current: None,
            storage,
        };
        store.restore();
        store
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn restore(&mut self) {
        let stored = match self.storage.get_item(CURRENT_USER_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(e) => {
                warn!("Unable to read stored session: {}", e);
                return;
            }
        };

        match serde_json::from_str::<User>(&stored) {
            Ok(user) => {
                info!("Restored session for {}", user.email);
                self.current = Some(user);
            }
            Err(e) => {
                error!("Error parsing stored user: {}", e);
                if let Err(e) = self.storage.remove_item(CURRENT_USER_KEY) {
                    warn!("Unable to discard stored session: {}", e);
                }
            }
        }
    }

    fn find_by_email(&self, email: &str) -> Option<usize> {
        let email = email.trim().to_lowercase();
        self.accounts
            .iter()
            .position(|account| account.user.email.to_lowercase() == email)
    }

    fn set_current(&mut self, user: User) -> Result<User> {
        let json = serde_json::to_string(&user)
            .map_err(|e| EcoRideError::storage(format!("Unable to encode user: {e}")))?;
        self.storage.set_item(CURRENT_USER_KEY, &json)?;
        self.current = Some(user.clone());
        Ok(user)
    }
}

impl<S: SessionStorage> SessionStore for MockSessionStore<S> {
    #[tracing::instrument(level = "debug", skip(self, password))]
    fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let user = self
            .find_by_email(email)
            .map(|index| &self.accounts[index])
            .filter(|account| account.password == password)
            .map(|account| account.user.clone())
            .ok_or_else(|| EcoRideError::auth("Invalid email or password"))?;

        info!("Welcome back, {}!", user.name);
        self.set_current(user)
    }

    #[tracing::instrument(level = "debug", skip(self, password))]
    fn register(&mut self, name: &str, email: &str, password: &str) -> Result<User> {
        let (name, email) = (name.trim(), email.trim());
        if password.is_empty() {
            return Err(EcoRideError::validation("Password is required"));
        }
        validate_identity(name, email)?;
        if self.find_by_email(email).is_some() {
            return Err(EcoRideError::auth("Email already in use"));
        }

        let user = User {
            id: (self.accounts.len() + 1).to_string(),
            email: email.to_string(),
            name: name.to_string(),
            profile_picture: None,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });

        info!("Welcome to EcoRide, {}!", user.name);
        self.set_current(user)
    }

    fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.current.take() {
            info!("Logged out {}", user.email);
        }
        self.storage.remove_item(CURRENT_USER_KEY)
    }

    fn current_user(&self) -> Option<User> {
        self.current.clone()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn update_profile(&mut self, update: ProfileUpdate) -> Result<User> {
        let mut user = self.current.clone().ok_or(EcoRideError::NotAuthenticated)?;
        let update = ProfileUpdate {
            name: update.name.map(|name| name.trim().to_string()),
            email: update.email.map(|email| email.trim().to_string()),
            ..update
        };
        validate_identity(
            update.name.as_deref().unwrap_or(&user.name),
            update.email.as_deref().unwrap_or(&user.email),
        )?;

        if let Some(email) = &update.email {
            if self
                .find_by_email(email)
                .is_some_and(|index| self.accounts[index].user.id != user.id)
            {
                return Err(EcoRideError::auth("Email already in use"));
            }
        }

        update.apply_to(&mut user);
        if let Some(account) = self.accounts.iter_mut().find(|a| a.user.id == user.id) {
            account.user = user.clone();
        }

        info!("Profile updated for {}", user.id);
        self.set_current(user)
    }
}
