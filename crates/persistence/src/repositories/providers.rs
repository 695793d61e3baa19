//! Read-only Postgres implementations of the provider ports.
//!
//! User and location management live in other services; these lookups are
//! the whole surface this system consumes from them.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::services::{LocationProvider, LocationSnapshot, ProviderError, UserDirectory};

/// User directory backed by the shared users table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn display_name(&self, user_id: Uuid) -> Result<Option<String>, ProviderError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT display_name FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(row.map(|(name,)| name))
    }

    async fn exists(&self, user_id: Uuid) -> Result<bool, ProviderError> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(row.0)
    }
}

/// Location provider backed by the shared locations table.
#[derive(Clone)]
pub struct PgLocationProvider {
    pool: PgPool,
}

impl PgLocationProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationProvider for PgLocationProvider {
    async fn find(&self, location_id: Uuid) -> Result<Option<LocationSnapshot>, ProviderError> {
        let row: Option<(f64, f64, String)> = sqlx::query_as(
            r#"
            SELECT latitude, longitude, address FROM locations
            WHERE id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(row.map(|(latitude, longitude, address)| LocationSnapshot {
            latitude,
            longitude,
            address,
        }))
    }
}
