//! PostgreSQL-backed user store

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{generate_referral_code, StoreError, UniqueField, UserStore};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, wallet_address, username, avatar, points, referral_code, \
                            is_admin, last_login_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_wallet_address_key") => UniqueField::WalletAddress,
                    Some("users_referral_code_key") => UniqueField::ReferralCode,
                    _ => UniqueField::Username,
                };
                return StoreError::Conflict(field);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_wallet_address(
        &self,
        wallet_address: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE wallet_address = $1"
        ))
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, wallet_address, username, referral_code)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.wallet_address)
        .bind(&new_user.username)
        .bind(generate_referral_code())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $2, avatar = $3, points = $4, is_admin = $5,
                last_login_at = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.avatar)
        .bind(user.points)
        .bind(user.is_admin)
        .bind(user.last_login_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::Backend(format!("user {} does not exist", user.id)))?;

        Ok(saved)
    }

    async fn check_health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
