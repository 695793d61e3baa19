//! Participation entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Participation, ParticipationStatus};

/// Database enum for participation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "participation_status")]
pub enum ParticipationStatusDb {
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "CONFIRMED")]
    Confirmed,
    #[sqlx(rename = "REJECTED")]
    Rejected,
    #[sqlx(rename = "CANCELLED")]
    Cancelled,
}

impl From<ParticipationStatus> for ParticipationStatusDb {
    fn from(status: ParticipationStatus) -> Self {
        match status {
            ParticipationStatus::Pending => ParticipationStatusDb::Pending,
            ParticipationStatus::Confirmed => ParticipationStatusDb::Confirmed,
            ParticipationStatus::Rejected => ParticipationStatusDb::Rejected,
            ParticipationStatus::Cancelled => ParticipationStatusDb::Cancelled,
        }
    }
}

impl From<ParticipationStatusDb> for ParticipationStatus {
    fn from(status: ParticipationStatusDb) -> Self {
        match status {
            ParticipationStatusDb::Pending => ParticipationStatus::Pending,
            ParticipationStatusDb::Confirmed => ParticipationStatus::Confirmed,
            ParticipationStatusDb::Rejected => ParticipationStatus::Rejected,
            ParticipationStatusDb::Cancelled => ParticipationStatus::Cancelled,
        }
    }
}

/// Database row mapping for the participations table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipationEntity {
    pub id: Uuid,
    pub version: i64,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipationStatusDb,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ParticipationEntity> for Participation {
    fn from(entity: ParticipationEntity) -> Self {
        Self {
            id: entity.id,
            version: entity.version,
            match_id: entity.match_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            joined_at: entity.joined_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
