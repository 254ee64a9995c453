use std::sync::Arc;

use chrono::Utc;

use crate::{AccountData, Database, Result, UpdatedAccount};

/// Read and administrative access to accounts.
///
/// Credential changes live on [crate::Auth], everything else about an
/// account goes through here.
pub struct AccountDirectory<Db> {
    db: Arc<Db>,
}

impl<Db> AccountDirectory<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> Result<Vec<AccountData>> {
        self.db.list_accounts().await
    }

    pub async fn get(&self, account_id: &str) -> Result<AccountData> {
        self.db.account_by_id(account_id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<AccountData> {
        self.db.account_by_email(email).await
    }

    pub async fn update(&self, updated_account: UpdatedAccount) -> Result<AccountData> {
        self.db.update_account(updated_account).await
    }

    /// Bans an account as of now. Banning an already banned account moves
    /// the ban date and counts as another ban.
    pub async fn ban(&self, account_id: &str) -> Result<AccountData> {
        self.db.set_ban(account_id, Some(Utc::now())).await
    }

    pub async fn unban(&self, account_id: &str) -> Result<AccountData> {
        self.db.set_ban(account_id, None).await
    }

    pub async fn delete(&self, account_id: &str) -> Result<()> {
        self.db.delete_account(account_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewAccount;
    use crate::testing::MemoryDatabase;

    fn directory() -> AccountDirectory<MemoryDatabase> {
        AccountDirectory::new(&Arc::new(MemoryDatabase::default()))
    }

    #[tokio::test]
    async fn banning_sets_the_date_and_bumps_the_count() {
        let directory = directory();

        let account = directory
            .db
            .create_account(NewAccount {
                email: "troublemaker@b.com".to_string(),
                password: "hash".to_string(),
                is_admin: false,
                is_organizer: false,
            })
            .await
            .unwrap();

        assert!(account.ban_date.is_none());
        assert_eq!(account.ban_count, 0);

        let banned = directory.ban(&account.id).await.unwrap();
        assert!(banned.ban_date.is_some());
        assert_eq!(banned.ban_count, 1);

        // Lifting the ban clears the date but not the count
        let unbanned = directory.unban(&account.id).await.unwrap();
        assert!(unbanned.ban_date.is_none());
        assert_eq!(unbanned.ban_count, 1);

        let banned_again = directory.ban(&account.id).await.unwrap();
        assert_eq!(banned_again.ban_count, 2);
    }
}
