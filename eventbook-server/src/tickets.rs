use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use eventbook_core::{util, NewTicket, TicketData, TicketFilter};

use crate::{
    auth::{AdminSession, OrganizerSession, Session},
    errors::{ServerError, ServerResult},
    schemas::{NewTicketSchema, TicketFilterSchema, UpdateTicketSchema, ValidatedJson},
    Router, ServerContext,
};

async fn list_tickets(
    State(context): State<ServerContext>,
    _session: Session,
) -> ServerResult<Json<Vec<TicketData>>> {
    let tickets = context.eventbook.tickets.list().await?;

    Ok(Json(tickets))
}

async fn create_ticket(
    State(context): State<ServerContext>,
    _session: Session,
    ValidatedJson(body): ValidatedJson<NewTicketSchema>,
) -> ServerResult<(StatusCode, Json<TicketData>)> {
    let ticket = context
        .eventbook
        .tickets
        .issue(NewTicket {
            event_id: body.event_id,
            assigned_to: body.assigned_to,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Looks up tickets by event and/or assignee. No matches is a 404 rather
/// than an empty list.
async fn filter_tickets(
    State(context): State<ServerContext>,
    _session: Session,
    ValidatedJson(body): ValidatedJson<TicketFilterSchema>,
) -> ServerResult<Json<Vec<TicketData>>> {
    let tickets = context
        .eventbook
        .tickets
        .find(TicketFilter {
            event_id: body.event_id,
            assigned_to: body.assigned_to,
        })
        .await?;

    if tickets.is_empty() {
        return Err(ServerError::NotFound("Ticket"));
    }

    Ok(Json(tickets))
}

async fn ticket_by_id(
    State(context): State<ServerContext>,
    _session: Session,
    Path(ticket_id): Path<String>,
) -> ServerResult<Json<TicketData>> {
    if !util::is_object_id(&ticket_id) {
        return Err(ServerError::Validation("Invalid ticket id"));
    }

    let ticket = context.eventbook.tickets.get(&ticket_id).await?;

    Ok(Json(ticket))
}

async fn update_ticket(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(ticket_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateTicketSchema>,
) -> ServerResult<Json<TicketData>> {
    if !util::is_object_id(&ticket_id) {
        return Err(ServerError::Validation("Invalid ticket id"));
    }

    let ticket = context
        .eventbook
        .tickets
        .reassign(&ticket_id, &body.assigned_to)
        .await?;

    Ok(Json(ticket))
}

/// The organizer view over every issued ticket
async fn organizer_tickets(
    State(context): State<ServerContext>,
    _session: OrganizerSession,
) -> ServerResult<Json<Vec<TicketData>>> {
    let tickets = context.eventbook.tickets.list().await?;

    Ok(Json(tickets))
}

pub fn router() -> Router {
    Router::new()
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/filter", post(filter_tickets))
        .route("/tickets/:id", get(ticket_by_id).patch(update_ticket))
        .route("/organizer/tickets", get(organizer_tickets))
}
