use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{errors::ServerError, ServerContext};

/// Applies the broad request limit to everything that passes through it
pub async fn enforce_general_limit(
    State(context): State<ServerContext>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    context
        .general_limiter
        .check(addr.ip())
        .map_err(ServerError::RateLimited)?;

    Ok(next.run(request).await)
}
