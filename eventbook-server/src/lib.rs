use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
};

use axum::middleware;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod accounts;
mod admin;
mod auth;
mod chat;
mod context;
mod errors;
mod events;
mod health;
mod ratelimit;
mod reports;
mod schemas;
mod serialized;
mod tickets;

pub use context::ServerContext;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 8000;

pub type Router = axum::Router<ServerContext>;

/// Starts the eventbook server
pub async fn run_server(context: ServerContext) {
    let port = env::var("EVENTBOOK_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .merge(accounts::router())
        .merge(events::router())
        .merge(admin::router())
        .merge(tickets::router())
        .merge(reports::router())
        .merge(health::router())
        .merge(chat::router())
        .layer(middleware::from_fn_with_state(
            context.clone(),
            ratelimit::enforce_general_limit,
        ))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on port {}", port);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server runs");
}
