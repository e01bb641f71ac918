//! Shared fixtures for domain service tests. Each test gets its own
//! in-memory database and a fully wired service graph.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    Chore, CreateChoreRequest, CreateKidRequest, CreateRewardRequest, Kid, PointEntry, PointStatus,
    Reward, Role, User,
};
use uuid::Uuid;

use crate::domain::access_policy::AccessPolicy;
use crate::domain::chore_service::ChoreService;
use crate::domain::kid_service::KidService;
use crate::domain::points_service::{PointAwarder, PointsService};
use crate::domain::rewards_service::RewardsService;
use crate::storage::{
    Connection, LocalPhotoStore, NoopPhotoStore, PhotoStore, PointEntryStore, SqliteConnection,
    UserStore,
};

pub struct TestEnv {
    pub connection: Arc<SqliteConnection>,
    pub policy: AccessPolicy<SqliteConnection>,
    pub kid_service: KidService<SqliteConnection>,
    pub chore_service: ChoreService<SqliteConnection>,
    pub points_service: PointsService<SqliteConnection>,
    pub rewards_service: RewardsService<SqliteConnection>,
}

pub async fn setup() -> TestEnv {
    setup_with_photos(Arc::new(NoopPhotoStore)).await
}

/// Like [`setup`], but with a real photo store under a unique temp
/// directory, for tests that exercise uploads.
pub async fn setup_with_photo_dir() -> TestEnv {
    let root = std::env::temp_dir().join(format!("chore-photos-{}", Uuid::new_v4()));
    setup_with_photos(Arc::new(LocalPhotoStore::new(root))).await
}

async fn setup_with_photos(photo_store: Arc<dyn PhotoStore>) -> TestEnv {
    let connection = Arc::new(SqliteConnection::new_for_test().await.unwrap());
    let policy = AccessPolicy::new(connection.clone());

    let points_service = PointsService::new(connection.clone(), policy.clone());
    let awarder: Arc<dyn PointAwarder> = Arc::new(points_service.clone());
    let chore_service = ChoreService::new(connection.clone(), policy.clone(), photo_store, awarder);
    let rewards_service = RewardsService::new(connection.clone(), policy.clone());
    let kid_service = KidService::new(connection.clone(), policy.clone());

    TestEnv {
        connection,
        policy,
        kid_service,
        chore_service,
        points_service,
        rewards_service,
    }
}

/// Parent accounts come from the identity integration in production;
/// tests seed them straight into the user store.
pub async fn seed_parent(env: &TestEnv, email: &str) -> User {
    let user = User {
        id: User::generate_id(),
        email: email.to_string(),
        role: Role::Parent,
        first_name: "Test".into(),
        last_name: "Parent".into(),
        active: true,
        created_at: Utc::now().to_rfc3339(),
    };
    env.connection
        .create_user_repository()
        .store_user(&user)
        .await
        .unwrap();
    user
}

pub async fn seed_kid(env: &TestEnv, parent: &User, name: &str) -> Kid {
    env.kid_service
        .create_kid(
            CreateKidRequest {
                name: name.to_string(),
                date_of_birth: None,
                notes: None,
            },
            &parent.id,
        )
        .await
        .unwrap()
        .kid
}

pub async fn seed_chore(env: &TestEnv, parent: &User, kids: &[&Kid], points: i64) -> Chore {
    env.chore_service
        .create_chore(
            CreateChoreRequest {
                title: "Dishes".into(),
                description: "After dinner".into(),
                points: Some(points),
                kid_ids: Some(kids.iter().map(|k| k.id.clone()).collect()),
            },
            &parent.id,
        )
        .await
        .unwrap()
}

pub async fn seed_reward(env: &TestEnv, parent: &User, title: &str, points_cost: i64) -> Reward {
    env.rewards_service
        .create_reward(
            CreateRewardRequest {
                title: title.to_string(),
                description: String::new(),
                points_cost,
                is_active: None,
            },
            &parent.id,
        )
        .await
        .unwrap()
}

/// Insert a claimable ledger entry with an explicit earned_at, so FIFO
/// ordering in tests is deterministic.
pub async fn seed_entry(env: &TestEnv, kid_id: &str, amount: i64, earned_at: &str) -> PointEntry {
    let entry = PointEntry {
        id: PointEntry::generate_id(),
        kid_id: kid_id.to_string(),
        amount,
        status: PointStatus::Claimable,
        description: "Completed: Dishes".into(),
        chore_id: None,
        reward_id: None,
        earned_at: earned_at.to_string(),
        claimed_at: None,
    };
    env.connection
        .create_point_entry_repository()
        .store_entry(&entry)
        .await
        .unwrap();
    entry
}
