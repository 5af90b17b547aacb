mod fs;

pub use fs::FsStore;

use crate::error::Result;
use crate::model::{Handle, UserRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const USER_PREFIX: &str = "user:";
const AVATAR_PREFIX: &str = "avatar:";

pub type KeyPredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// Key-value persistence for account data.
///
/// Individual key reads and writes are serialized by the implementation;
/// there is no transaction spanning several keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn keys(&self) -> Result<Vec<String>>;
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<bool>;

    async fn values_matching(&self, predicate: KeyPredicate<'_>) -> Result<Vec<(String, Value)>> {
        let mut values = Vec::new();
        for key in self.keys().await? {
            if !predicate(&key) {
                continue;
            }
            if let Some(value) = self.get(&key).await? {
                values.push((key, value));
            }
        }
        Ok(values)
    }
}

pub fn user_key(handle: &Handle) -> String {
    format!("{}{}", USER_PREFIX, handle)
}

pub fn avatar_key(handle: &Handle) -> String {
    format!("{}{}", AVATAR_PREFIX, handle)
}

/// Typed access to user and avatar records.
#[derive(Clone)]
pub struct AccountRepository {
    store: Arc<dyn KeyValueStore>,
}

impl AccountRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn all_users(&self) -> Result<Vec<UserRecord>> {
        let is_user = |key: &str| key.starts_with(USER_PREFIX);
        let values = self.store.values_matching(&is_user).await?;

        let mut users = Vec::with_capacity(values.len());
        for (key, value) in values {
            match serde_json::from_value::<UserRecord>(value) {
                Ok(user) => users.push(user),
                Err(e) => tracing::warn!(%key, error = %e, "skipping malformed user record"),
            }
        }
        Ok(users)
    }

    pub async fn user(&self, handle: &Handle) -> Result<Option<UserRecord>> {
        match self.store.get(&user_key(handle)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn save_user(&self, record: &UserRecord) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.store.set(&user_key(&record.handle), value).await
    }

    pub async fn remove_user(&self, handle: &Handle) -> Result<bool> {
        self.store.remove(&user_key(handle)).await
    }

    pub async fn set_avatar(&self, handle: &Handle, avatar: Value) -> Result<()> {
        self.store.set(&avatar_key(handle), avatar).await
    }

    pub async fn avatar(&self, handle: &Handle) -> Result<Option<Value>> {
        self.store.get(&avatar_key(handle)).await
    }

    pub async fn remove_avatar(&self, handle: &Handle) -> Result<bool> {
        self.store.remove(&avatar_key(handle)).await
    }
}
