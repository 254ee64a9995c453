//! All schemas that are exposed from endpoints are defined here
//! along with the [ToSerialized] impls

use chrono::{DateTime, Utc};
use eventbook_core::AccountData;
use serde::Serialize;

/// An account as shown to other users. The password hash stays out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub is_organizer: bool,
    pub ban_date: Option<DateTime<Utc>>,
    pub ban_count: i32,
    pub events: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub message: &'static str,
    pub token: String,
    pub account: Account,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Account> for AccountData {
    fn to_serialized(&self) -> Account {
        Account {
            id: self.id.clone(),
            email: self.email.clone(),
            is_admin: self.is_admin,
            is_organizer: self.is_organizer,
            ban_date: self.ban_date,
            ban_count: self.ban_count,
            events: self.events.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
