use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{Role, User};
use sqlx::{sqlite::SqliteRow, Row};

use super::SqliteConnection;
use crate::storage::UserStore;

#[derive(Clone)]
pub struct UserRepository {
    connection: SqliteConnection,
}

impl UserRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        role: Role::parse(&role).ok_or_else(|| anyhow!("unknown role: {role}"))?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn store_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, first_name, last_name, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.active)
        .bind(&user.created_at)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, role, first_name, last_name, active, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.connection.pool())
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, role, first_name, last_name, active, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.connection.pool())
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(self.connection.pool())
            .await?;
        Ok(())
    }
}
