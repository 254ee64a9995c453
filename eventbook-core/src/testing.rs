//! In-memory stand-ins used by the test suites

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use crate::util::object_id;
use crate::{
    AccountData, CacheError, CacheResult, CacheStore, ChatHistoryEntry, ChatMessageData,
    ChatRoomData, ChatUserData, Database, DatabaseError, EventData, NewAccount, NewChatMessage,
    NewEvent, NewReport, NewTicket, ReportData, Result, TicketData, TicketFilter, UpdatedAccount,
    UpdatedEvent,
};

/// A [Database] backed by plain collections
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<State>,
    room_upserts_fail: AtomicBool,
}

impl MemoryDatabase {
    /// Makes every subsequent room upsert fail, for exercising error paths
    pub fn fail_room_upserts(&self) {
        self.room_upserts_fail.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct State {
    accounts: Vec<AccountData>,
    events: Vec<EventData>,
    tickets: Vec<TicketData>,
    reports: Vec<ReportData>,
    chat_users: Vec<ChatUserData>,
    chat_rooms: Vec<ChatRoomData>,
    chat_messages: Vec<ChatMessageData>,
}

fn not_found(resource: &'static str) -> DatabaseError {
    DatabaseError::NotFound {
        resource,
        identifier: "id",
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn account_by_id(&self, account_id: &str) -> Result<AccountData> {
        self.state
            .lock()
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or(not_found("Account"))
    }

    async fn account_by_email(&self, email: &str) -> Result<AccountData> {
        self.state
            .lock()
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned()
            .ok_or(not_found("Account"))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountData>> {
        Ok(self.state.lock().accounts.clone())
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<AccountData> {
        let mut state = self.state.lock();

        if state.accounts.iter().any(|a| a.email == new_account.email) {
            return Err(DatabaseError::Conflict {
                resource: "Account",
                field: "email",
                value: new_account.email,
            });
        }

        let now = Utc::now();
        let account = AccountData {
            id: object_id(),
            email: new_account.email,
            password: new_account.password,
            is_admin: new_account.is_admin,
            is_organizer: new_account.is_organizer,
            ban_date: None,
            ban_count: 0,
            events: vec![],
            created_at: now,
            updated_at: now,
        };

        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account(&self, updated_account: UpdatedAccount) -> Result<AccountData> {
        let mut state = self.state.lock();

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == updated_account.id)
            .ok_or(not_found("Account"))?;

        if let Some(email) = updated_account.email {
            account.email = email;
        }

        account.events.extend(updated_account.push_events);
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn set_password(&self, account_id: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock();

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(not_found("Account"))?;

        account.password = password.to_string();
        account.updated_at = Utc::now();

        Ok(())
    }

    async fn push_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData> {
        let mut state = self.state.lock();

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(not_found("Account"))?;

        account.events.push(event_id.to_string());
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn pull_account_event(&self, account_id: &str, event_id: &str) -> Result<AccountData> {
        let mut state = self.state.lock();

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(not_found("Account"))?;

        account.events.retain(|e| e != event_id);
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn set_ban(
        &self,
        account_id: &str,
        ban_date: Option<chrono::DateTime<Utc>>,
    ) -> Result<AccountData> {
        let mut state = self.state.lock();

        let account = state
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(not_found("Account"))?;

        if ban_date.is_some() {
            account.ban_count += 1;
        }

        account.ban_date = ban_date;
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn delete_account(&self, account_id: &str) -> Result<()> {
        let mut state = self.state.lock();

        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != account_id);

        if state.accounts.len() == before {
            return Err(not_found("Account"));
        }

        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<EventData>> {
        Ok(self.state.lock().events.clone())
    }

    async fn event_by_id(&self, event_id: &str) -> Result<EventData> {
        self.state
            .lock()
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or(not_found("Event"))
    }

    async fn create_event(&self, new_event: NewEvent) -> Result<EventData> {
        let now = Utc::now();
        let event = EventData {
            id: object_id(),
            price: new_event.price,
            title: new_event.title,
            description: new_event.description,
            location: new_event.location,
            max_people: new_event.max_people,
            total_people: new_event.total_people,
            date: new_event.date,
            created_at: now,
            updated_at: now,
        };

        self.state.lock().events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, updated_event: UpdatedEvent) -> Result<EventData> {
        let mut state = self.state.lock();

        let event = state
            .events
            .iter_mut()
            .find(|e| e.id == updated_event.id)
            .ok_or(not_found("Event"))?;

        if let Some(price) = updated_event.price {
            event.price = price;
        }
        if let Some(title) = updated_event.title {
            event.title = title;
        }
        if let Some(description) = updated_event.description {
            event.description = description;
        }
        if let Some(location) = updated_event.location {
            event.location = location;
        }
        if let Some(max_people) = updated_event.max_people {
            event.max_people = max_people;
        }
        if let Some(total_people) = updated_event.total_people {
            event.total_people = total_people;
        }
        if let Some(date) = updated_event.date {
            event.date = date;
        }

        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn delete_event_cascading(&self, event_id: &str) -> Result<()> {
        let mut state = self.state.lock();

        let before = state.events.len();
        state.events.retain(|e| e.id != event_id);

        if state.events.len() == before {
            return Err(not_found("Event"));
        }

        for account in state.accounts.iter_mut() {
            account.events.retain(|e| e != event_id);
        }

        Ok(())
    }

    async fn list_tickets(&self) -> Result<Vec<TicketData>> {
        Ok(self.state.lock().tickets.clone())
    }

    async fn ticket_by_id(&self, ticket_id: &str) -> Result<TicketData> {
        self.state
            .lock()
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .cloned()
            .ok_or(not_found("Ticket"))
    }

    async fn filter_tickets(&self, filter: TicketFilter) -> Result<Vec<TicketData>> {
        Ok(self
            .state
            .lock()
            .tickets
            .iter()
            .filter(|t| {
                filter
                    .event_id
                    .as_ref()
                    .map(|event_id| &t.event_id == event_id)
                    .unwrap_or(true)
                    && filter
                        .assigned_to
                        .as_ref()
                        .map(|assigned_to| &t.assigned_to == assigned_to)
                        .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn create_ticket(&self, new_ticket: NewTicket) -> Result<TicketData> {
        let now = Utc::now();
        let ticket = TicketData {
            id: object_id(),
            event_id: new_ticket.event_id,
            assigned_to: new_ticket.assigned_to,
            created_at: now,
            updated_at: now,
        };

        self.state.lock().tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, ticket_id: &str, assigned_to: &str) -> Result<TicketData> {
        let mut state = self.state.lock();

        let ticket = state
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or(not_found("Ticket"))?;

        ticket.assigned_to = assigned_to.to_string();
        ticket.updated_at = Utc::now();

        Ok(ticket.clone())
    }

    async fn list_reports(&self) -> Result<Vec<ReportData>> {
        Ok(self.state.lock().reports.clone())
    }

    async fn create_report(&self, new_report: NewReport) -> Result<ReportData> {
        let report = ReportData {
            id: object_id(),
            email: new_report.email,
            report_text: new_report.report_text,
            category: new_report.category,
            status: "Pending".to_string(),
            created_at: Utc::now(),
        };

        self.state.lock().reports.push(report.clone());
        Ok(report)
    }

    async fn delete_report(&self, report_id: &str) -> Result<()> {
        let mut state = self.state.lock();

        let before = state.reports.len();
        state.reports.retain(|r| r.id != report_id);

        if state.reports.len() == before {
            return Err(not_found("Report"));
        }

        Ok(())
    }

    async fn upsert_chat_user(&self, email: &str) -> Result<ChatUserData> {
        let mut state = self.state.lock();

        if let Some(user) = state.chat_users.iter().find(|u| u.email == email) {
            return Ok(user.clone());
        }

        let user = ChatUserData {
            id: object_id(),
            email: email.to_string(),
            created_at: Utc::now(),
        };

        state.chat_users.push(user.clone());
        Ok(user)
    }

    async fn upsert_chat_room(&self, name: &str) -> Result<ChatRoomData> {
        if self.room_upserts_fail.load(Ordering::SeqCst) {
            return Err(DatabaseError::Internal("chat rooms are unavailable".into()));
        }

        let mut state = self.state.lock();

        if let Some(room) = state.chat_rooms.iter().find(|r| r.name == name) {
            return Ok(room.clone());
        }

        let room = ChatRoomData {
            id: object_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        state.chat_rooms.push(room.clone());
        Ok(room)
    }

    async fn create_chat_message(&self, new_message: NewChatMessage) -> Result<ChatMessageData> {
        let message = ChatMessageData {
            id: object_id(),
            room_id: new_message.room_id,
            user_id: new_message.user_id,
            text: new_message.text,
            created_at: Utc::now(),
        };

        self.state.lock().chat_messages.push(message.clone());
        Ok(message)
    }

    async fn chat_messages_by_room(&self, room_id: &str) -> Result<Vec<ChatHistoryEntry>> {
        let state = self.state.lock();

        Ok(state
            .chat_messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .map(|m| ChatHistoryEntry {
                text: m.text.clone(),
                email: state
                    .chat_users
                    .iter()
                    .find(|u| u.id == m.user_id)
                    .map(|u| u.email.clone())
                    .unwrap_or_else(|| "Anonymous".to_string()),
                created_at: m.created_at,
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// A [CacheStore] backed by a map, ignoring expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_ex(&self, key: &str, value: &str, _ttl_seconds: u64) -> CacheResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn flush_all(&self) -> CacheResult<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

/// A [CacheStore] where every operation fails, for exercising fallbacks
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Unreachable("down for the test".to_string()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl_seconds: u64) -> CacheResult<()> {
        Err(CacheError::Unreachable("down for the test".to_string()))
    }

    async fn del(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Unreachable("down for the test".to_string()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Unreachable("down for the test".to_string()))
    }

    async fn flush_all(&self) -> CacheResult<()> {
        Err(CacheError::Unreachable("down for the test".to_string()))
    }
}

/// A plausible event a week out, for tests that just need one
pub fn new_event(title: &str) -> NewEvent {
    NewEvent {
        price: "Free".to_string(),
        title: title.to_string(),
        description: "An event".to_string(),
        location: "Somewhere".to_string(),
        max_people: 100,
        total_people: 0,
        date: Utc::now() + Duration::days(7),
    }
}
