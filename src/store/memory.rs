//! In-memory user store for development and tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{generate_referral_code, StoreError, UniqueField, UserStore};
use crate::models::{NewUser, User};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored principals
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn clashes(existing: &User, candidate: &User) -> Option<UniqueField> {
    if existing.id == candidate.id {
        None
    } else if existing.wallet_address == candidate.wallet_address {
        Some(UniqueField::WalletAddress)
    } else if existing.username == candidate.username {
        Some(UniqueField::Username)
    } else if existing.referral_code == candidate.referral_code {
        Some(UniqueField::ReferralCode)
    } else {
        None
    }
}

fn first_clash(users: &HashMap<Uuid, User>, candidate: &User) -> Option<UniqueField> {
    users
        .values()
        .find_map(|existing| clashes(existing, candidate))
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_wallet_address(
        &self,
        wallet_address: &str,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.wallet_address == wallet_address)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let now = Utc::now();

        let mut user = User {
            id: Uuid::new_v4(),
            wallet_address: new_user.wallet_address,
            username: new_user.username,
            avatar: None,
            points: 0,
            referral_code: generate_referral_code(),
            is_admin: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        loop {
            match first_clash(&users, &user) {
                None => break,
                Some(UniqueField::ReferralCode) => user.referral_code = generate_referral_code(),
                Some(field) => return Err(StoreError::Conflict(field)),
            }
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(StoreError::Backend(format!("user {} does not exist", user.id)));
        }
        if let Some(field) = first_clash(&users, user) {
            return Err(StoreError::Conflict(field));
        }

        let mut stored = user.clone();
        stored.updated_at = Utc::now();
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
