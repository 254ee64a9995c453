use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type used for entity ids in the database.
/// Ids are 24 character hexadecimal strings.
pub type EntityId = String;

/// An eventbook account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccountData {
    pub id: EntityId,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub is_organizer: bool,
    /// Set when an admin bans the account, cleared when the ban is lifted
    pub ban_date: Option<DateTime<Utc>>,
    /// How many times this account has been banned. Never decreases.
    pub ban_count: i32,
    /// Ids of the events this account has joined
    pub events: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventData {
    pub id: EntityId,
    /// Free-form price tag, as displayed to users
    pub price: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub max_people: i32,
    pub total_people: i32,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A ticket assigning a person to an event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketData {
    pub id: EntityId,
    pub event_id: EntityId,
    pub assigned_to: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user submitted report
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportData {
    pub id: EntityId,
    pub email: String,
    pub report_text: String,
    pub category: String,
    /// Workflow status, starts out as "Pending"
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A chat participant, keyed by email
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatUserData {
    pub id: EntityId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A chat room, keyed by name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatRoomData {
    pub id: EntityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted chat message
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessageData {
    pub id: EntityId,
    pub room_id: EntityId,
    pub user_id: EntityId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A chat message joined with its author, as returned by history queries
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ChatHistoryEntry {
    pub text: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
