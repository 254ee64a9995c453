//! The domain layer of eventbook: accounts, events, tickets, reports, and
//! realtime chat, in front of a postgres database with a redis cache.
//!
//! Everything is reached through [Eventbook], which wires the services
//! together over a shared [Database] implementation.

use std::sync::Arc;

mod accounts;
mod auth;
mod cache;
mod chat;
mod db;
mod email;
mod events;
mod ratelimit;
mod reports;
mod tickets;

pub mod util;

#[cfg(test)]
pub mod testing;

pub use accounts::*;
pub use auth::*;
pub use cache::*;
pub use chat::*;
pub use db::*;
pub use email::*;
pub use events::*;
pub use ratelimit::*;
pub use reports::*;
pub use tickets::*;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Secret used to sign and verify session tokens
    pub token_secret: String,
}

/// The root service object. One of these exists per process.
pub struct Eventbook<Db> {
    pub database: Arc<Db>,
    pub cache: CacheLayer,

    pub auth: Auth<Db>,
    pub accounts: AccountDirectory<Db>,
    pub events: EventLibrary<Db>,
    pub tickets: TicketOffice<Db>,
    pub reports: ReportDesk<Db>,
    pub chat: Arc<Chat<Db>>,
}

impl<Db> Eventbook<Db>
where
    Db: Database,
{
    pub fn new(
        config: CoreConfig,
        database: Db,
        cache_store: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let database = Arc::new(database);
        let cache = CacheLayer::new(cache_store);

        Self {
            auth: Auth::new(&database, &config.token_secret, mailer),
            accounts: AccountDirectory::new(&database),
            events: EventLibrary::new(&database, cache.clone()),
            tickets: TicketOffice::new(&database),
            reports: ReportDesk::new(&database),
            chat: Arc::new(Chat::new(&database)),
            cache,
            database,
        }
    }
}
