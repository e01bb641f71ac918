use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{Chore, ChoreStatus};
use sqlx::{sqlite::SqliteRow, Row};

use super::SqliteConnection;
use crate::storage::ChoreStore;

#[derive(Clone)]
pub struct ChoreRepository {
    connection: SqliteConnection,
}

impl ChoreRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    async fn load_assigned_kids(&self, chore_id: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT kid_id FROM chore_assignments WHERE chore_id = ? ORDER BY kid_id",
        )
        .bind(chore_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter()
            .map(|row| Ok(row.try_get("kid_id")?))
            .collect()
    }

    async fn rows_to_chores(&self, rows: &[SqliteRow]) -> Result<Vec<Chore>> {
        let mut chores = Vec::with_capacity(rows.len());
        for row in rows {
            let mut chore = row_to_chore(row)?;
            chore.assigned_kid_ids = self.load_assigned_kids(&chore.id).await?;
            chores.push(chore);
        }
        Ok(chores)
    }
}

fn row_to_chore(row: &SqliteRow) -> Result<Chore> {
    let status: String = row.try_get("status")?;
    Ok(Chore {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: ChoreStatus::parse(&status).ok_or_else(|| anyhow!("unknown chore status: {status}"))?,
        points: row.try_get("points")?,
        date_started: row.try_get("date_started")?,
        photo: row.try_get("photo")?,
        parent_id: row.try_get("parent_id")?,
        assigned_kid_ids: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const CHORE_COLUMNS: &str =
    "id, title, description, status, points, date_started, photo, parent_id, created_at, updated_at";

#[async_trait]
impl ChoreStore for ChoreRepository {
    async fn store_chore(&self, chore: &Chore) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chores (id, title, description, status, points, date_started, photo, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chore.id)
        .bind(&chore.title)
        .bind(&chore.description)
        .bind(chore.status.as_str())
        .bind(chore.points)
        .bind(&chore.date_started)
        .bind(&chore.photo)
        .bind(&chore.parent_id)
        .bind(&chore.created_at)
        .bind(&chore.updated_at)
        .execute(&mut *tx)
        .await?;

        for kid_id in &chore.assigned_kid_ids {
            sqlx::query("INSERT INTO chore_assignments (chore_id, kid_id) VALUES (?, ?)")
                .bind(&chore.id)
                .bind(kid_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_chore(&self, chore_id: &str) -> Result<Option<Chore>> {
        let row = sqlx::query(&format!("SELECT {CHORE_COLUMNS} FROM chores WHERE id = ?"))
            .bind(chore_id)
            .fetch_optional(self.connection.pool())
            .await?;

        match row {
            Some(row) => {
                let mut chore = row_to_chore(&row)?;
                chore.assigned_kid_ids = self.load_assigned_kids(&chore.id).await?;
                Ok(Some(chore))
            }
            None => Ok(None),
        }
    }

    async fn list_chores_by_parent(&self, parent_id: &str) -> Result<Vec<Chore>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHORE_COLUMNS} FROM chores WHERE parent_id = ? ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .fetch_all(self.connection.pool())
        .await?;

        self.rows_to_chores(&rows).await
    }

    async fn list_chores_by_kid(&self, kid_id: &str) -> Result<Vec<Chore>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CHORE_COLUMNS} FROM chores
            WHERE id IN (SELECT chore_id FROM chore_assignments WHERE kid_id = ?)
            ORDER BY created_at DESC
            "#
        ))
        .bind(kid_id)
        .fetch_all(self.connection.pool())
        .await?;

        self.rows_to_chores(&rows).await
    }

    async fn update_chore_details(&self, chore: &Chore) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE chores
            SET title = ?, description = ?, points = ?, photo = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&chore.title)
        .bind(&chore.description)
        .bind(chore.points)
        .bind(&chore.photo)
        .bind(&chore.updated_at)
        .bind(&chore.id)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn set_assigned_kids(&self, chore_id: &str, kid_ids: &[String], updated_at: &str) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query("DELETE FROM chore_assignments WHERE chore_id = ?")
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        for kid_id in kid_ids {
            sqlx::query("INSERT INTO chore_assignments (chore_id, kid_id) VALUES (?, ?)")
                .bind(chore_id)
                .bind(kid_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE chores SET updated_at = ? WHERE id = ?")
            .bind(updated_at)
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn transition_chore(&self, chore: &Chore, expected: ChoreStatus) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chores
            SET status = ?, date_started = ?, photo = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(chore.status.as_str())
        .bind(&chore.date_started)
        .bind(&chore.photo)
        .bind(&chore.updated_at)
        .bind(&chore.id)
        .bind(expected.as_str())
        .execute(self.connection.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_chore(&self, chore_id: &str) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        sqlx::query("DELETE FROM chore_assignments WHERE chore_id = ?")
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE point_entries SET chore_id = NULL WHERE chore_id = ?")
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM chores WHERE id = ?")
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
