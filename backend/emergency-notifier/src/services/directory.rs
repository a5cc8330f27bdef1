/// User directory access
///
/// The notifier only reads the directory. The default radius lookup is a full
/// scan; an implementation with a spatial index can override
/// `candidates_near` without changing the notifier.
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::error::DirectoryError;
use crate::models::{GeoPoint, UserDirectoryEntry, UserRole};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Enumerate every user record
    async fn fetch_all_users(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError>;

    /// Entries that may lie within `radius_km` of `origin`. Implementations
    /// may over-approximate; callers still filter by exact distance.
    async fn candidates_near(
        &self,
        _origin: GeoPoint,
        _radius_km: f64,
    ) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        self.fetch_all_users().await
    }
}

/// Postgres-backed directory
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn fetch_all_users(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        let query = r#"
            SELECT role, latitude, longitude, device_token
            FROM users
        "#;

        let rows = sqlx::query(query).fetch_all(&self.db).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let role: Option<String> = row.try_get("role")?;
            let latitude: Option<f64> = row.try_get("latitude")?;
            let longitude: Option<f64> = row.try_get("longitude")?;
            let device_token: Option<String> = row.try_get("device_token")?;

            entries.push(entry_from_columns(
                role.as_deref(),
                latitude,
                longitude,
                device_token,
            ));
        }

        debug!("Loaded {} user directory entries", entries.len());
        Ok(entries)
    }
}

/// Stored coordinates that are partial or out of range count as "no location".
fn entry_from_columns(
    role: Option<&str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    device_token: Option<String>,
) -> UserDirectoryEntry {
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon).ok(),
        _ => None,
    };

    UserDirectoryEntry {
        role: role.map(UserRole::parse).unwrap_or(UserRole::Unknown),
        location,
        device_token: device_token.filter(|t| !t.trim().is_empty()),
    }
}

/// Fixed directory for local runs and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    entries: Vec<UserDirectoryEntry>,
}

impl InMemoryUserDirectory {
    pub fn new(entries: Vec<UserDirectoryEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn fetch_all_users(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        Ok(self.entries.clone())
    }
}
