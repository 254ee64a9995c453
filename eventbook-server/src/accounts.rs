use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json,
};
use eventbook_core::{AuthError, Database, UpdatedAccount};
use serde_json::{json, Value};

use crate::{
    auth::Session,
    errors::{ServerError, ServerResult},
    schemas::{
        ChangePasswordSchema, LoginSchema, RegisterSchema, UpdateAccountSchema, ValidatedJson,
    },
    serialized::{Account, LoginResult, ToSerialized},
    Router, ServerContext,
};

async fn register(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<RegisterSchema>,
) -> ServerResult<(StatusCode, Json<Account>)> {
    let account = context
        .eventbook
        .auth
        .register(&body.email, &body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account.to_serialized())))
}

async fn login(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<Json<LoginResult>> {
    let (account, token) = context
        .eventbook
        .auth
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(LoginResult {
        message: "Login successful",
        token,
        account: account.to_serialized(),
    }))
}

async fn list_accounts(
    State(context): State<ServerContext>,
    _session: Session,
) -> ServerResult<Json<Vec<Account>>> {
    let accounts = context.eventbook.accounts.list().await?;

    Ok(Json(accounts.to_serialized()))
}

async fn account_by_id(
    State(context): State<ServerContext>,
    _session: Session,
    Path(account_id): Path<String>,
) -> ServerResult<Json<Account>> {
    let account = context.eventbook.accounts.get(&account_id).await?;

    Ok(Json(account.to_serialized()))
}

/// Updates the caller's own account. Joining events goes through the event
/// library so capacity is enforced and attendance is bumped.
async fn update_account(
    State(context): State<ServerContext>,
    session: Session,
    Path(account_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateAccountSchema>,
) -> ServerResult<Json<Account>> {
    if session.account().id != account_id {
        return Err(ServerError::Auth(AuthError::Forbidden(
            "Accounts can only be edited by their owner",
        )));
    }

    for event_id in &body.events {
        context.eventbook.events.join(event_id, &account_id).await?;
    }

    if body.email.is_some() {
        context
            .eventbook
            .accounts
            .update(UpdatedAccount {
                id: account_id.clone(),
                email: body.email,
                push_events: vec![],
            })
            .await?;
    }

    let account = context.eventbook.accounts.get(&account_id).await?;
    Ok(Json(account.to_serialized()))
}

/// Removes an event from the caller's joined events
async fn remove_account_event(
    State(context): State<ServerContext>,
    session: Session,
    Path(event_id): Path<String>,
) -> ServerResult<Json<Account>> {
    let account = context
        .eventbook
        .database
        .pull_account_event(&session.account().id, &event_id)
        .await?;

    Ok(Json(account.to_serialized()))
}

async fn change_password(
    State(context): State<ServerContext>,
    Path(account_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ChangePasswordSchema>,
) -> ServerResult<Json<Value>> {
    context
        .eventbook
        .auth
        .change_password(&account_id, &body.password)
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Sends a password reset email. Narrowly rate limited, since it triggers
/// outgoing mail.
async fn request_password_reset(
    State(context): State<ServerContext>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Path(email): Path<String>,
) -> ServerResult<Json<Value>> {
    let ip = connect_info
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    context
        .reset_limiter
        .check(ip)
        .map_err(ServerError::RateLimited)?;

    context.eventbook.auth.request_password_reset(&email).await?;

    Ok(Json(json!({ "message": "Password reset email sent" })))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/accounts", get(list_accounts))
        .route("/accounts/:id", get(account_by_id))
        .route("/edit/account/:id", patch(update_account))
        .route("/remove/account/event/:id", delete(remove_account_event))
        .route(
            "/edit/password/:id",
            patch(change_password).get(request_password_reset),
        )
}
