use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod data;
pub use data::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

/// Represents a type that can fetch eventbook data from a database
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn account_by_id(&self, account_id: &str) -> Result<AccountData>;
    async fn account_by_email(&self, email: &str) -> Result<AccountData>;
    async fn list_accounts(&self) -> Result<Vec<AccountData>>;
    async fn create_account(&self, new_account: NewAccount) -> Result<AccountData>;
    async fn update_account(&self, updated_account: UpdatedAccount) -> Result<AccountData>;
    async fn set_password(&self, account_id: &str, password: &str) -> Result<()>;
    async fn push_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData>;
    async fn pull_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData>;
    async fn set_ban(&self, account_id: &str, ban_date: Option<DateTime<Utc>>)
        -> Result<AccountData>;
    async fn delete_account(&self, account_id: &str) -> Result<()>;

    async fn list_events(&self) -> Result<Vec<EventData>>;
    async fn event_by_id(&self, event_id: &str) -> Result<EventData>;
    async fn create_event(&self, new_event: NewEvent) -> Result<EventData>;
    async fn update_event(&self, updated_event: UpdatedEvent) -> Result<EventData>;
    /// Deletes an event and removes its id from every account that joined it,
    /// in a single transaction
    async fn delete_event_cascading(&self, event_id: &str) -> Result<()>;

    async fn list_tickets(&self) -> Result<Vec<TicketData>>;
    async fn ticket_by_id(&self, ticket_id: &str) -> Result<TicketData>;
    async fn filter_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketData>>;
    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<TicketData>;
    async fn update_ticket(&self, ticket_id: &str, assigned_to: &str) -> Result<TicketData>;

    async fn list_reports(&self) -> Result<Vec<ReportData>>;
    async fn create_report(&self, new_report: NewReport) -> Result<ReportData>;
    async fn delete_report(&self, report_id: &str) -> Result<()>;

    async fn upsert_chat_user(&self, email: &str) -> Result<ChatUserData>;
    async fn upsert_chat_room(&self, name: &str) -> Result<ChatRoomData>;
    async fn create_chat_message(&self, new_message: NewChatMessage) -> Result<ChatMessageData>;
    /// Returns all messages of a room joined with their authors, oldest first
    async fn chat_messages_by_room(&self, room_id: &str) -> Result<Vec<ChatHistoryEntry>>;

    /// Liveness check
    async fn ping(&self) -> Result<()>;
}

#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    /// Already hashed by the caller
    pub password: String,
    pub is_admin: bool,
    pub is_organizer: bool,
}

#[derive(Debug, Default)]
pub struct UpdatedAccount {
    pub id: EntityId,
    pub email: Option<String>,
    /// Event ids to append to the account's joined events
    pub push_events: Vec<EntityId>,
}

#[derive(Debug)]
pub struct NewEvent {
    pub price: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub max_people: i32,
    pub total_people: i32,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct UpdatedEvent {
    pub id: EntityId,
    pub price: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub max_people: Option<i32>,
    pub total_people: Option<i32>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct NewTicket {
    pub event_id: EntityId,
    pub assigned_to: String,
}

#[derive(Debug, Default)]
pub struct TicketFilter {
    pub event_id: Option<EntityId>,
    pub assigned_to: Option<String>,
}

#[derive(Debug)]
pub struct NewReport {
    pub email: String,
    pub report_text: String,
    pub category: String,
}

#[derive(Debug)]
pub struct NewChatMessage {
    pub room_id: EntityId,
    pub user_id: EntityId,
    pub text: String,
}
