use std::sync::Arc;

use crate::{Database, NewTicket, Result, TicketData, TicketFilter};

/// Issues and looks up tickets
pub struct TicketOffice<Db> {
    db: Arc<Db>,
}

impl<Db> TicketOffice<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> Result<Vec<TicketData>> {
        self.db.list_tickets().await
    }

    pub async fn get(&self, ticket_id: &str) -> Result<TicketData> {
        self.db.ticket_by_id(ticket_id).await
    }

    /// Looks up tickets matching the given filter. An empty filter returns
    /// every ticket.
    pub async fn find(&self, filter: TicketFilter) -> Result<Vec<TicketData>> {
        self.db.filter_tickets(filter).await
    }

    /// Issues a ticket for an event. The event has to exist.
    pub async fn issue(&self, new_ticket: NewTicket) -> Result<TicketData> {
        self.db.event_by_id(&new_ticket.event_id).await?;
        self.db.create_ticket(new_ticket).await
    }

    /// Reassigns a ticket to someone else
    pub async fn reassign(&self, ticket_id: &str, assigned_to: &str) -> Result<TicketData> {
        self.db.update_ticket(ticket_id, assigned_to).await
    }
}
