use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

use super::{ChoreRepository, KidRepository, PointRepository, RewardRepository, UserRepository};
use crate::storage::Connection;

/// SQLite-backed storage connection. Cheap to clone; all repositories
/// share the underlying pool.
#[derive(Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl SqliteConnection {
    /// Connect to the given database URL, creating the database and
    /// schema if they do not exist yet.
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        // One connection is always held open; shared-cache in-memory
        // databases live exactly as long as their last connection.
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(url)
            .await?;
        Self::setup_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Connect to a fresh in-memory database with a unique name, so
    /// parallel tests never share state.
    #[cfg(test)]
    pub async fn new_for_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:memdb_{}?mode=memory&cache=shared", test_id);
        Self::new(&url).await
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kids (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                date_of_birth TEXT,
                notes TEXT,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                parent_id TEXT NOT NULL REFERENCES users (id),
                user_id TEXT NOT NULL REFERENCES users (id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_kids_parent_id
            ON kids(parent_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chores (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                points INTEGER NOT NULL DEFAULT 0,
                date_started TEXT,
                photo TEXT,
                parent_id TEXT NOT NULL REFERENCES users (id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_chores_parent_id
            ON chores(parent_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chore_assignments (
                chore_id TEXT NOT NULL REFERENCES chores (id),
                kid_id TEXT NOT NULL REFERENCES kids (id),
                PRIMARY KEY (chore_id, kid_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_chore_assignments_kid_id
            ON chore_assignments(kid_id);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS point_entries (
                id TEXT PRIMARY KEY,
                kid_id TEXT NOT NULL REFERENCES kids (id),
                amount INTEGER NOT NULL,
                status TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                chore_id TEXT,
                reward_id TEXT,
                earned_at TEXT NOT NULL,
                claimed_at TEXT
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_point_entries_kid_status
            ON point_entries(kid_id, status);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rewards (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                points_cost INTEGER NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                parent_id TEXT NOT NULL REFERENCES users (id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_rewards_parent_id
            ON rewards(parent_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

impl Connection for SqliteConnection {
    type UserRepository = UserRepository;
    type KidRepository = KidRepository;
    type ChoreRepository = ChoreRepository;
    type PointEntryRepository = PointRepository;
    type RewardRepository = RewardRepository;

    fn create_user_repository(&self) -> UserRepository {
        UserRepository::new(self.clone())
    }

    fn create_kid_repository(&self) -> KidRepository {
        KidRepository::new(self.clone())
    }

    fn create_chore_repository(&self) -> ChoreRepository {
        ChoreRepository::new(self.clone())
    }

    fn create_point_entry_repository(&self) -> PointRepository {
        PointRepository::new(self.clone())
    }

    fn create_reward_repository(&self) -> RewardRepository {
        RewardRepository::new(self.clone())
    }
}
