use axum::{
    extract::{Path, State},
    routing::{get, patch},
    Json,
};
use eventbook_core::{util, EventData, UpdatedEvent};

use crate::{
    auth::{AdminSession, Session},
    errors::{ServerError, ServerResult},
    schemas::{UpdateEventSchema, ValidatedJson},
    Router, ServerContext,
};

async fn list_events(
    State(context): State<ServerContext>,
    _session: Session,
) -> ServerResult<Json<Vec<EventData>>> {
    let events = context.eventbook.events.list().await?;

    Ok(Json(events))
}

async fn event_by_id(
    State(context): State<ServerContext>,
    _session: Session,
    Path(event_id): Path<String>,
) -> ServerResult<Json<EventData>> {
    if !util::is_object_id(&event_id) {
        return Err(ServerError::Validation("Invalid event id"));
    }

    let event = context.eventbook.events.get(&event_id).await?;

    Ok(Json(event))
}

async fn update_event(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(event_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateEventSchema>,
) -> ServerResult<Json<EventData>> {
    if !util::is_object_id(&event_id) {
        return Err(ServerError::Validation("Invalid event id"));
    }

    let event = context
        .eventbook
        .events
        .update(UpdatedEvent {
            id: event_id,
            title: body.title,
            description: body.description,
            location: body.location,
            price: body.price,
            max_people: body.max_people,
            total_people: body.total_people,
            date: body.date,
        })
        .await?;

    Ok(Json(event))
}

pub fn router() -> Router {
    Router::new()
        .route("/view/events", get(list_events))
        .route("/view/events/:id", get(event_by_id))
        .route("/edit/events/:id", patch(update_event))
}
