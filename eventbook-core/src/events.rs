use std::sync::Arc;

use crate::{
    util::sanitize_text, CacheLayer, Database, DatabaseError, EventData, NewEvent, Result,
    UpdatedEvent,
};

/// Cache key for the full event listing
const EVENTS_KEY: &str = "events";

fn event_key(event_id: &str) -> String {
    format!("event:{}", event_id)
}

/// Read and write access to events, with a cache in front of the reads.
///
/// Writes go straight to the database and drop the keys they made stale, so
/// the next read repopulates the cache.
pub struct EventLibrary<Db> {
    db: Arc<Db>,
    cache: CacheLayer,
}

impl<Db> EventLibrary<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>, cache: CacheLayer) -> Self {
        Self {
            db: db.clone(),
            cache,
        }
    }

    pub async fn list(&self) -> Result<Vec<EventData>> {
        self.cache
            .get_or_compute(EVENTS_KEY, || self.db.list_events())
            .await
    }

    pub async fn get(&self, event_id: &str) -> Result<EventData> {
        self.cache
            .get_or_compute(&event_key(event_id), || self.db.event_by_id(event_id))
            .await
    }

    pub async fn create(&self, new_event: NewEvent) -> Result<EventData> {
        let event = self.db.create_event(new_event).await?;

        self.cache.invalidate(&[EVENTS_KEY]).await;
        Ok(event)
    }

    /// Edits an event. Free-form string fields are sanitized before they are
    /// stored, since they get rendered back to users.
    pub async fn update(&self, mut updated_event: UpdatedEvent) -> Result<EventData> {
        updated_event.title = updated_event.title.as_deref().map(sanitize_text);
        updated_event.description = updated_event.description.as_deref().map(sanitize_text);
        updated_event.location = updated_event.location.as_deref().map(sanitize_text);
        updated_event.price = updated_event.price.as_deref().map(sanitize_text);

        let key = event_key(&updated_event.id);
        let event = self.db.update_event(updated_event).await?;

        self.cache.invalidate(&[EVENTS_KEY, &key]).await;
        Ok(event)
    }

    /// Deletes an event along with every account's reference to it
    pub async fn delete(&self, event_id: &str) -> Result<()> {
        self.db.delete_event_cascading(event_id).await?;

        self.cache
            .invalidate(&[EVENTS_KEY, &event_key(event_id)])
            .await;
        Ok(())
    }

    /// Books a spot on an event for an account. Bumps the event's attendance
    /// and records the event on the account.
    pub async fn join(&self, event_id: &str, account_id: &str) -> Result<EventData> {
        let event = self.db.event_by_id(event_id).await?;

        if event.total_people >= event.max_people {
            return Err(DatabaseError::Conflict {
                resource: "Event",
                field: "capacity",
                value: event.max_people.to_string(),
            });
        }

        let updated = self
            .db
            .update_event(UpdatedEvent {
                id: event.id.clone(),
                total_people: Some(event.total_people + 1),
                ..UpdatedEvent::default()
            })
            .await?;

        self.db.push_account_event(account_id, event_id).await?;

        self.cache
            .invalidate(&[EVENTS_KEY, &event_key(event_id)])
            .await;

        Ok(updated)
    }
}
