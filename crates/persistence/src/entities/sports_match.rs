//! Match entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Match, MatchStatus};

/// Database enum for match status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "match_status")]
pub enum MatchStatusDb {
    #[sqlx(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "CONFIRMED")]
    Confirmed,
    #[sqlx(rename = "FULL")]
    Full,
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[sqlx(rename = "ENDED")]
    Ended,
    #[sqlx(rename = "CANCELLED")]
    Cancelled,
}

impl From<MatchStatus> for MatchStatusDb {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Pending => MatchStatusDb::Pending,
            MatchStatus::Confirmed => MatchStatusDb::Confirmed,
            MatchStatus::Full => MatchStatusDb::Full,
            MatchStatus::InProgress => MatchStatusDb::InProgress,
            MatchStatus::Ended => MatchStatusDb::Ended,
            MatchStatus::Cancelled => MatchStatusDb::Cancelled,
        }
    }
}

impl From<MatchStatusDb> for MatchStatus {
    fn from(status: MatchStatusDb) -> Self {
        match status {
            MatchStatusDb::Pending => MatchStatus::Pending,
            MatchStatusDb::Confirmed => MatchStatus::Confirmed,
            MatchStatusDb::Full => MatchStatus::Full,
            MatchStatusDb::InProgress => MatchStatus::InProgress,
            MatchStatusDb::Ended => MatchStatus::Ended,
            MatchStatusDb::Cancelled => MatchStatus::Cancelled,
        }
    }
}

/// Database row mapping for the matches table.
#[derive(Debug, Clone, FromRow)]
pub struct MatchEntity {
    pub id: Uuid,
    pub version: i64,
    pub host_id: Uuid,
    pub host_name: String,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub match_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: MatchStatusDb,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MatchEntity> for Match {
    fn from(entity: MatchEntity) -> Self {
        Self {
            id: entity.id,
            version: entity.version,
            host_id: entity.host_id,
            host_name: entity.host_name,
            title: entity.title,
            description: entity.description,
            latitude: entity.latitude,
            longitude: entity.longitude,
            address: entity.address,
            match_date: entity.match_date,
            start_time: entity.start_time,
            end_time: entity.end_time,
            max_participants: entity.max_participants,
            current_participants: entity.current_participants,
            status: entity.status.into(),
            cancelled_at: entity.cancelled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            MatchStatus::Pending,
            MatchStatus::Confirmed,
            MatchStatus::Full,
            MatchStatus::InProgress,
            MatchStatus::Ended,
            MatchStatus::Cancelled,
        ] {
            let db: MatchStatusDb = status.into();
            let back: MatchStatus = db.into();
            assert_eq!(back, status);
        }
    }
}
