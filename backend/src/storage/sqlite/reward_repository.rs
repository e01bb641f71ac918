use anyhow::Result;
use async_trait::async_trait;
use shared::Reward;
use sqlx::{sqlite::SqliteRow, Row};

use super::SqliteConnection;
use crate::storage::RewardStore;

#[derive(Clone)]
pub struct RewardRepository {
    connection: SqliteConnection,
}

impl RewardRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }
}

fn row_to_reward(row: &SqliteRow) -> Result<Reward> {
    Ok(Reward {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        points_cost: row.try_get("points_cost")?,
        is_active: row.try_get("is_active")?,
        parent_id: row.try_get("parent_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const REWARD_COLUMNS: &str =
    "id, title, description, points_cost, is_active, parent_id, created_at, updated_at";

#[async_trait]
impl RewardStore for RewardRepository {
    async fn store_reward(&self, reward: &Reward) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO rewards (id, title, description, points_cost, is_active, parent_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reward.id)
        .bind(&reward.title)
        .bind(&reward.description)
        .bind(reward.points_cost)
        .bind(reward.is_active)
        .bind(&reward.parent_id)
        .bind(&reward.created_at)
        .bind(&reward.updated_at)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>> {
        let row = sqlx::query(&format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = ?"))
            .bind(reward_id)
            .fetch_optional(self.connection.pool())
            .await?;

        row.as_ref().map(row_to_reward).transpose()
    }

    async fn list_rewards(&self, parent_id: &str) -> Result<Vec<Reward>> {
        let rows = sqlx::query(&format!(
            "SELECT {REWARD_COLUMNS} FROM rewards WHERE parent_id = ? ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_reward).collect()
    }

    async fn list_active_rewards(&self, parent_id: &str) -> Result<Vec<Reward>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REWARD_COLUMNS} FROM rewards
            WHERE parent_id = ? AND is_active = TRUE
            ORDER BY points_cost ASC
            "#
        ))
        .bind(parent_id)
        .fetch_all(self.connection.pool())
        .await?;

        rows.iter().map(row_to_reward).collect()
    }

    async fn update_reward(&self, reward: &Reward) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE rewards
            SET title = ?, description = ?, points_cost = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&reward.title)
        .bind(&reward.description)
        .bind(reward.points_cost)
        .bind(reward.is_active)
        .bind(&reward.updated_at)
        .bind(&reward.id)
        .execute(self.connection.pool())
        .await?;
        Ok(())
    }

    async fn delete_reward(&self, reward_id: &str) -> Result<()> {
        let mut tx = self.connection.pool().begin().await?;

        // Matches the SET NULL relation in the original data model:
        // consumed entries stay claimed but lose the reward reference.
        sqlx::query("UPDATE point_entries SET reward_id = NULL WHERE reward_id = ?")
            .bind(reward_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM rewards WHERE id = ?")
            .bind(reward_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
