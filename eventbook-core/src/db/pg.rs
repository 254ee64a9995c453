use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, query, query_as, Error as SqlxError, PgPool};

use crate::{
    util::object_id, AccountData, ChatHistoryEntry, ChatMessageData, ChatRoomData, ChatUserData,
    Database, DatabaseError, DatabaseResult, EventData, IntoDatabaseError, NewAccount,
    NewChatMessage, NewEvent, NewReport, NewTicket, ReportData, Result, TicketData, TicketFilter,
    UpdatedAccount, UpdatedEvent,
};

/// A postgres database implementation for eventbook
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn account_by_id(&self, account_id: &str) -> Result<AccountData> {
        query_as::<_, AccountData>("SELECT * FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("Account", "id"))
    }

    async fn account_by_email(&self, email: &str) -> Result<AccountData> {
        query_as::<_, AccountData>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("Account", "email"))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountData>> {
        query_as::<_, AccountData>("SELECT * FROM accounts ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<AccountData> {
        self.account_by_email(&new_account.email)
            .await
            .conflict_or_ok("Account", "email", &new_account.email)?;

        query_as::<_, AccountData>(
            "INSERT INTO accounts (id, email, password, is_admin, is_organizer)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(object_id())
        .bind(&new_account.email)
        .bind(&new_account.password)
        .bind(new_account.is_admin)
        .bind(new_account.is_organizer)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn update_account(&self, updated_account: UpdatedAccount) -> Result<AccountData> {
        let account = self.account_by_id(&updated_account.id).await?;

        query(
            "UPDATE accounts SET
                email = $1,
                events = events || $2,
                updated_at = now()
            WHERE id = $3",
        )
        .bind(updated_account.email.unwrap_or(account.email))
        .bind(&updated_account.push_events)
        .bind(&updated_account.id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.account_by_id(&updated_account.id).await
    }

    async fn set_password(&self, account_id: &str, password: &str) -> Result<()> {
        // Ensure account exists
        let _ = self.account_by_id(account_id).await?;

        query("UPDATE accounts SET password = $1, updated_at = now() WHERE id = $2")
            .bind(password)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn push_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData> {
        let _ = self.account_by_id(account_id).await?;

        query(
            "UPDATE accounts SET events = array_append(events, $1), updated_at = now()
             WHERE id = $2",
        )
        .bind(event_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.account_by_id(account_id).await
    }

    async fn pull_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData> {
        let _ = self.account_by_id(account_id).await?;

        query(
            "UPDATE accounts SET events = array_remove(events, $1), updated_at = now()
             WHERE id = $2",
        )
        .bind(event_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.account_by_id(account_id).await
    }

    async fn set_ban(
        &self,
        account_id: &str,
        ban_date: Option<DateTime<Utc>>,
    ) -> Result<AccountData> {
        let _ = self.account_by_id(account_id).await?;

        match ban_date {
            Some(date) => query(
                "UPDATE accounts SET ban_date = $1, ban_count = ban_count + 1, updated_at = now()
                 WHERE id = $2",
            )
            .bind(date)
            .bind(account_id),
            None => query("UPDATE accounts SET ban_date = NULL, updated_at = now() WHERE id = $1")
                .bind(account_id),
        }
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.account_by_id(account_id).await
    }

    async fn delete_account(&self, account_id: &str) -> Result<()> {
        // Ensure account exists
        let _ = self.account_by_id(account_id).await?;

        query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn list_events(&self) -> Result<Vec<EventData>> {
        query_as::<_, EventData>("SELECT * FROM events ORDER BY date")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn event_by_id(&self, event_id: &str) -> Result<EventData> {
        query_as::<_, EventData>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("Event", "id"))
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventData> {
        query_as::<_, EventData>(
            "INSERT INTO events (id, price, title, description, location, max_people, total_people, date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(object_id())
        .bind(&new_event.price)
        .bind(&new_event.title)
        .bind(&new_event.description)
        .bind(&new_event.location)
        .bind(new_event.max_people)
        .bind(new_event.total_people)
        .bind(new_event.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn update_event(&self, updated_event: UpdatedEvent) -> Result<EventData> {
        let event = self.event_by_id(&updated_event.id).await?;

        query(
            "UPDATE events SET
                price = $1,
                title = $2,
                description = $3,
                location = $4,
                max_people = $5,
                total_people = $6,
                date = $7,
                updated_at = now()
            WHERE id = $8",
        )
        .bind(updated_event.price.unwrap_or(event.price))
        .bind(updated_event.title.unwrap_or(event.title))
        .bind(updated_event.description.unwrap_or(event.description))
        .bind(updated_event.location.unwrap_or(event.location))
        .bind(updated_event.max_people.unwrap_or(event.max_people))
        .bind(updated_event.total_people.unwrap_or(event.total_people))
        .bind(updated_event.date.unwrap_or(event.date))
        .bind(&updated_event.id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.event_by_id(&updated_event.id).await
    }

    async fn delete_event_cascading(&self, event_id: &str) -> Result<()> {
        // Ensure event exists
        let _ = self.event_by_id(event_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        query("UPDATE accounts SET events = array_remove(events, $1), updated_at = now()")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())
    }

    async fn list_tickets(&self) -> Result<Vec<TicketData>> {
        query_as::<_, TicketData>("SELECT * FROM tickets ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn ticket_by_id(&self, ticket_id: &str) -> Result<TicketData> {
        query_as::<_, TicketData>("SELECT * FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("Ticket", "id"))
    }

    async fn filter_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketData>> {
        query_as::<_, TicketData>(
            "SELECT * FROM tickets
             WHERE ($1::text IS NULL OR event_id = $1)
               AND ($2::text IS NULL OR assigned_to = $2)
             ORDER BY created_at",
        )
        .bind(filter.event_id)
        .bind(filter.assigned_to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<TicketData> {
        query_as::<_, TicketData>(
            "INSERT INTO tickets (id, event_id, assigned_to)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(object_id())
        .bind(&new_ticket.event_id)
        .bind(&new_ticket.assigned_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn update_ticket(&self, ticket_id: &str, assigned_to: &str) -> Result<TicketData> {
        let _ = self.ticket_by_id(ticket_id).await?;

        query("UPDATE tickets SET assigned_to = $1, updated_at = now() WHERE id = $2")
            .bind(assigned_to)
            .bind(ticket_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        self.ticket_by_id(ticket_id).await
    }

    async fn list_reports(&self) -> Result<Vec<ReportData>> {
        query_as::<_, ReportData>("SELECT * FROM reports ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn create_report(&self, new_report: NewReport) -> Result<ReportData> {
        query_as::<_, ReportData>(
            "INSERT INTO reports (id, email, report_text, category)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(object_id())
        .bind(&new_report.email)
        .bind(&new_report.report_text)
        .bind(&new_report.category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn delete_report(&self, report_id: &str) -> Result<()> {
        query_as::<_, ReportData>("SELECT * FROM reports WHERE id = $1")
            .bind(report_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("Report", "id"))?;

        query("DELETE FROM reports WHERE id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn upsert_chat_user(&self, email: &str) -> Result<ChatUserData> {
        query_as::<_, ChatUserData>(
            "INSERT INTO chat_users (id, email)
             VALUES ($1, $2)
             ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
             RETURNING *",
        )
        .bind(object_id())
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn upsert_chat_room(&self, name: &str) -> Result<ChatRoomData> {
        query_as::<_, ChatRoomData>(
            "INSERT INTO chat_rooms (id, name)
             VALUES ($1, $2)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING *",
        )
        .bind(object_id())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_chat_message(&self, new_message: NewChatMessage) -> Result<ChatMessageData> {
        query_as::<_, ChatMessageData>(
            "INSERT INTO chat_messages (id, room_id, user_id, text)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(object_id())
        .bind(&new_message.room_id)
        .bind(&new_message.user_id)
        .bind(&new_message.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn chat_messages_by_room(&self, room_id: &str) -> Result<Vec<ChatHistoryEntry>> {
        query_as::<_, ChatHistoryEntry>(
            "SELECT
                chat_messages.text,
                COALESCE(chat_users.email, 'Anonymous') AS email,
                chat_messages.created_at
            FROM chat_messages
                LEFT JOIN chat_users ON chat_messages.user_id = chat_users.id
            WHERE room_id = $1
            ORDER BY chat_messages.created_at, chat_messages.id",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn ping(&self) -> Result<()> {
        query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
