use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};
use eventbook_core::{AccountData, Authorized, Capability};

use crate::{errors::ServerError, ServerContext};

/// Any authenticated account
pub struct Session(Authorized);

/// An authenticated account with the admin flag
pub struct AdminSession(Authorized);

/// An authenticated account with the organizer flag
pub struct OrganizerSession(Authorized);

impl Session {
    pub fn account(&self) -> &AccountData {
        &self.0.account
    }
}

impl AdminSession {
    pub fn account(&self) -> &AccountData {
        &self.0.account
    }
}

impl OrganizerSession {
    pub fn account(&self) -> &AccountData {
        &self.0.account
    }
}

/// The caller's address, taken from the connection info. Falls back to the
/// unspecified address if the server runs without it, as in handler tests.
fn client_ip(parts: &Parts) -> IpAddr {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

async fn authorize(
    parts: &mut Parts,
    context: &ServerContext,
    capability: Capability,
) -> Result<Authorized, ServerError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|x| x.to_str().ok());

    context
        .eventbook
        .auth
        .authorize(client_ip(parts), header, capability)
        .await
        .map_err(ServerError::from)
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Capability::User).await.map(Self)
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Capability::Admin).await.map(Self)
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for OrganizerSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        authorize(parts, state, Capability::Organizer)
            .await
            .map(Self)
    }
}
