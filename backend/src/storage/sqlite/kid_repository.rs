use anyhow::Result;
use async_trait::async_trait;
use shared::Kid;
use sqlx::{sqlite::SqliteRow, Row};

use super::SqliteConnection;
use crate::storage::KidStore;

#[derive(Clone)]
pub struct KidRepository {
    connection: SqliteConnection,
}

impl KidRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn row_to_kid(row: &SqliteRow) -> Result<Kid> {
    Ok(Kid {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        date_of_birth: row.try_get("date_of_birth")?,
        notes: row.try_get("notes")?,
        active: row.try_get("active")?,
        parent_id: row.try_get("parent_id")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const KID_COLUMNS: &str =
    "id, name, date_of_birth, notes, active, parent_id, user_id, created_at, updated_at";

#[async_trait]
impl KidStore for KidRepository {
    async fn store_kid(&self, kid: &Kid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kids (id, name, date_of_birth, notes, active, parent_id, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&kid.id)
        .bind(&kid.name)
        .bind(&kid.date_of_birth)
        .bind(&kid.notes)
        .bind(kid.active)
        .bind(&kid.parent_id)
        .bind(&kid.user_id)
        .bind(&kid.created_at)
        .bind(&kid.updated_at)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn get_kid(&self, kid_id: &str) -> Result<Option<Kid>> {
        let row = sqlx::query(&format!("SELECT {KID_COLUMNS} FROM kids WHERE id = ?"))
            .bind(kid_id)
            .fetch_optional(self.connection.pool())
            .await?;

        row.as_ref().map(row_to_kid).transpose()
    }

    async fn get_kid_by_user(&self, user_id: &str) -> Result<Option<Kid>> {
        let row = sqlx::query(&format!("SELECT {KID_COLUMNS} FROM kids WHERE user_id = ?"))
            .bind(user_id)
            .fetch_optional(self.connection.pool())
            .await?;

        row.as_ref().map(row_to_kid).transpose()
    }

    async fn list_kids(&self, parent_id: &str) -> Result<Vec<Kid>> {
        let rows = sqlx::query(&format!(
            "SELECT {KID_COLUMNS} FROM kids WHERE parent_id = ? ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_kid).collect()
    }

    async fn count_kids(&self, parent_id: &str) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM kids WHERE parent_id = ?")
            .bind(parent_id)
            .fetch_one(self.connection.pool())
            .await?;
        Ok(row.try_get("count")?)
    }

    async fn update_kid(&self, kid: &Kid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE kids
            SET name = ?, date_of_birth = ?, notes = ?, active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&kid.name)
        .bind(&kid.date_of_birth)
        .bind(&kid.notes)
        .bind(kid.active)
        .bind(&kid.updated_at)
        .bind(&kid.id)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn delete_kid(&self, kid_id: &str) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query("DELETE FROM chore_assignments WHERE kid_id = ?")
            .bind(kid_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM point_entries WHERE kid_id = ?")
            .bind(kid_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM kids WHERE id = ?")
            .bind(kid_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
