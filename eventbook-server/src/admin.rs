use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json,
};
use eventbook_core::{util, AccountData, EventData, NewEvent};
use serde_json::{json, Value};

use crate::{
    auth::AdminSession,
    errors::{ServerError, ServerResult},
    schemas::{NewEventSchema, ValidatedJson},
    serialized::{Account, ToSerialized},
    Router, ServerContext,
};

/// Returns accounts with all their fields, password hashes included
async fn list_accounts(
    State(context): State<ServerContext>,
    _session: AdminSession,
) -> ServerResult<Json<Vec<AccountData>>> {
    let accounts = context.eventbook.accounts.list().await?;

    Ok(Json(accounts))
}

async fn add_event(
    State(context): State<ServerContext>,
    _session: AdminSession,
    ValidatedJson(body): ValidatedJson<NewEventSchema>,
) -> ServerResult<(StatusCode, Json<EventData>)> {
    let event = context
        .eventbook
        .events
        .create(NewEvent {
            price: body.price,
            title: body.title,
            description: body.description,
            location: body.location,
            max_people: body.max_people,
            total_people: body.total_people,
            date: body.date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// Deletes an event and every account's reference to it
async fn delete_event(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(event_id): Path<String>,
) -> ServerResult<Json<Value>> {
    if !util::is_object_id(&event_id) {
        return Err(ServerError::Validation("Invalid event id"));
    }

    context.eventbook.events.delete(&event_id).await?;

    Ok(Json(json!({ "message": "Event deleted" })))
}

async fn ban_account(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(account_id): Path<String>,
) -> ServerResult<Json<Account>> {
    let account = context.eventbook.accounts.ban(&account_id).await?;

    Ok(Json(account.to_serialized()))
}

async fn unban_account(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(account_id): Path<String>,
) -> ServerResult<Json<Account>> {
    let account = context.eventbook.accounts.unban(&account_id).await?;

    Ok(Json(account.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/admin/accounts", get(list_accounts))
        .route("/admin/add/events", post(add_event))
        .route("/admin/events/:id", delete(delete_event))
        .route(
            "/admin/accounts/:id/ban",
            post(ban_account).delete(unban_account),
        )
}
