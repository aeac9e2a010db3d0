use crate::core::error::StoreError;
use crate::models::user::{UserAccount, UserUpdate};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Account persistence as seen by the profile code
pub trait UserStore: Send + Sync {
    fn get_by_id(&self, id: u32) -> Option<UserAccount>;

    /// Apply a partial update; fields left as `None` keep their value
    fn update_fields(&self, id: u32, update: &UserUpdate) -> Result<(), StoreError>;

    /// Add a new account, enforcing unique id, username and email
    fn insert(&self, account: UserAccount) -> Result<(), StoreError>;
}

/// In-memory account store
pub struct InMemoryUserStore {
    users: DashMap<u32, UserAccount>,
    usernames: DashMap<String, u32>,
    emails: DashMap<String, u32>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            usernames: DashMap::new(),
            emails: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn reserve(
        index: &DashMap<String, u32>,
        field: &'static str,
        value: &str,
        id: u32,
    ) -> Result<(), StoreError> {
        match index.entry(value.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                field,
                value: value.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn get_by_id(&self, id: u32) -> Option<UserAccount> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn update_fields(&self, id: u32, update: &UserUpdate) -> Result<(), StoreError> {
        let mut account = self.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(avatar_url) = &update.avatar_url {
            account.avatar_url = Some(avatar_url.clone());
        }
        if let Some(banner_url) = &update.banner_url {
            account.banner_url = Some(banner_url.clone());
        }

        Ok(())
    }

    fn insert(&self, account: UserAccount) -> Result<(), StoreError> {
        let id = account.id;

        Self::reserve(&self.usernames, "username", &account.username, id)?;

        if let Err(e) = Self::reserve(&self.emails, "email", &account.email, id) {
            self.usernames.remove(&account.username);
            return Err(e);
        }

        match self.users.entry(id) {
            Entry::Occupied(_) => {
                self.usernames.remove(&account.username);
                self.emails.remove(&account.email);
                Err(StoreError::Duplicate {
                    field: "id",
                    value: id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }
}
