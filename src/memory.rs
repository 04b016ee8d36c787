//! In-process store backing the unit and router tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{repo::CredentialStore, repo_types::User},
    db::StoreError,
    expenses::{
        repo::ExpenseStore,
        repo_types::{Expense, NewExpense},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    expenses: Vec<Expense>,
}

/// Both tables live under one lock, so the uniqueness check and the insert
/// in `create` happen atomically, like a UNIQUE constraint.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds users with ids 1..=n and a placeholder hash.
    pub fn with_users(usernames: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut t = store.tables.lock().unwrap();
            for name in usernames {
                let now = OffsetDateTime::now_utc();
                let id = t.users.len() as i64 + 1;
                t.users.push(User {
                    id,
                    username: (*name).to_owned(),
                    email: format!("{name}@example.com"),
                    password_hash: "$argon2id$placeholder".into(),
                    created_at: now,
                    updated_at: now,
                });
            }
        }
        store
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.username == username || u.email == email) {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: t.users.len() as i64 + 1,
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn create(&self, owner_id: i64, expense: &NewExpense) -> anyhow::Result<Expense> {
        let mut t = self.tables.lock().unwrap();
        anyhow::ensure!(
            t.users.iter().any(|u| u.id == owner_id),
            "foreign key violation: no user {owner_id}"
        );
        anyhow::ensure!(expense.amount_cents >= 0, "check violation: amount_cents");
        let now = OffsetDateTime::now_utc();
        let row = Expense {
            id: t.expenses.len() as i64 + 1,
            description: expense.description.clone(),
            amount_cents: expense.amount_cents,
            category: expense.category.clone(),
            expense_date: expense.expense_date,
            user_id: owner_id,
            created_at: now,
            updated_at: now,
        };
        t.expenses.push(row.clone());
        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: i64) -> anyhow::Result<Vec<Expense>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Expense> = t
            .expenses
            .iter()
            .filter(|e| e.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }
}
