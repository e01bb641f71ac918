use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{PointEntry, PointStatus};
use sqlx::{sqlite::SqliteRow, Row};

use super::SqliteConnection;
use crate::storage::PointEntryStore;

#[derive(Clone)]
pub struct PointRepository {
    connection: SqliteConnection,
}

impl PointRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<PointEntry> {
    let status: String = row.try_get("status")?;
    Ok(PointEntry {
        id: row.try_get("id")?,
        kid_id: row.try_get("kid_id")?,
        amount: row.try_get("amount")?,
        status: PointStatus::parse(&status).ok_or_else(|| anyhow!("unknown point status: {status}"))?,
        description: row.try_get("description")?,
        chore_id: row.try_get("chore_id")?,
        reward_id: row.try_get("reward_id")?,
        earned_at: row.try_get("earned_at")?,
        claimed_at: row.try_get("claimed_at")?,
    })
}

const ENTRY_COLUMNS: &str =
    "id, kid_id, amount, status, description, chore_id, reward_id, earned_at, claimed_at";

#[async_trait]
impl PointEntryStore for PointRepository {
    async fn store_entry(&self, entry: &PointEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO point_entries (id, kid_id, amount, status, description, chore_id, reward_id, earned_at, claimed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.kid_id)
        .bind(entry.amount)
        .bind(entry.status.as_str())
        .bind(&entry.description)
        .bind(&entry.chore_id)
        .bind(&entry.reward_id)
        .bind(&entry.earned_at)
        .bind(&entry.claimed_at)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn get_entries_by_ids(&self, kid_id: &str, entry_ids: &[String]) -> Result<Vec<PointEntry>> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; entry_ids.len()].join(", ");
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM point_entries WHERE kid_id = ? AND id IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql).bind(kid_id);
        for entry_id in entry_ids {
            query = query.bind(entry_id);
        }

        let rows = query.fetch_all(self.connection.pool()).await?;
        rows.iter().map(row_to_entry).collect()
    }

    async fn list_entries(&self, kid_id: &str) -> Result<Vec<PointEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM point_entries WHERE kid_id = ? ORDER BY earned_at DESC, id DESC"
        ))
        .bind(kid_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn list_claimable(&self, kid_id: &str) -> Result<Vec<PointEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM point_entries
            WHERE kid_id = ? AND status = 'claimable'
            ORDER BY earned_at DESC, id DESC
            "#
        ))
        .bind(kid_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn list_claimable_chronological(&self, kid_id: &str) -> Result<Vec<PointEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM point_entries
            WHERE kid_id = ? AND status = 'claimable'
            ORDER BY earned_at ASC, id ASC
            "#
        ))
        .bind(kid_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn list_redeemed(&self, kid_id: &str) -> Result<Vec<PointEntry>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM point_entries
            WHERE kid_id = ? AND status = 'claimed' AND reward_id IS NOT NULL
            ORDER BY claimed_at DESC, id DESC
            "#
        ))
        .bind(kid_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn claim_entries(
        &self,
        entry_ids: &[String],
        claimed_at: &str,
        reward_id: Option<&str>,
    ) -> Result<bool> {
        let mut tx = self.connection.pool().begin().await?;

        for entry_id in entry_ids {
            let result = sqlx::query(
                r#"
                UPDATE point_entries
                SET status = 'claimed', claimed_at = ?, reward_id = ?
                WHERE id = ? AND status = 'claimable'
                "#,
            )
            .bind(claimed_at)
            .bind(reward_id)
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

            // Another claim or redemption got here first; undo the
            // whole batch.
            if result.rows_affected() != 1 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}
