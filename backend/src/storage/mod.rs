//! # Storage Traits
//!
//! Defines the storage abstraction the domain layer works against, so
//! different backends can be swapped in without touching business logic.
//! The only shipped implementation is SQLite; tests run the same code
//! against in-memory databases.

pub mod photo;
pub mod sqlite;

pub use photo::{LocalPhotoStore, NoopPhotoStore, PhotoStore};
pub use sqlite::SqliteConnection;

use anyhow::Result;
use async_trait::async_trait;
use shared::{Chore, ChoreStatus, Kid, PointEntry, Reward, User};

/// Storage for login accounts. Account records mirror what the identity
/// provider knows about a caller; credentials never pass through here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn delete_user(&self, user_id: &str) -> Result<()>;
}

/// Storage for kid profiles.
#[async_trait]
pub trait KidStore: Send + Sync {
    async fn store_kid(&self, kid: &Kid) -> Result<()>;

    async fn get_kid(&self, kid_id: &str) -> Result<Option<Kid>>;

    /// Look up the kid profile linked to a login account.
    async fn get_kid_by_user(&self, user_id: &str) -> Result<Option<Kid>>;

    /// List a parent's kids, newest first.
    async fn list_kids(&self, parent_id: &str) -> Result<Vec<Kid>>;

    async fn count_kids(&self, parent_id: &str) -> Result<i64>;

    async fn update_kid(&self, kid: &Kid) -> Result<()>;

    /// Delete the kid along with their assignments and ledger entries.
    async fn delete_kid(&self, kid_id: &str) -> Result<()>;
}

/// Storage for chores and their kid assignments.
#[async_trait]
pub trait ChoreStore: Send + Sync {
    /// Store a new chore including its assignment rows.
    async fn store_chore(&self, chore: &Chore) -> Result<()>;

    async fn get_chore(&self, chore_id: &str) -> Result<Option<Chore>>;

    /// List a parent's chores, newest first.
    async fn list_chores_by_parent(&self, parent_id: &str) -> Result<Vec<Chore>>;

    /// List chores a kid is assigned to, newest first.
    async fn list_chores_by_kid(&self, kid_id: &str) -> Result<Vec<Chore>>;

    /// Persist editable fields (title, description, points, photo).
    /// Never touches id, parent, status or assignments.
    async fn update_chore_details(&self, chore: &Chore) -> Result<()>;

    /// Replace the chore's assignment set.
    async fn set_assigned_kids(&self, chore_id: &str, kid_ids: &[String], updated_at: &str) -> Result<()>;

    /// Persist a status transition, guarded by a compare-and-swap on
    /// the source status. Returns false (and changes nothing) when the
    /// stored status no longer matches `expected`, so two racing
    /// transitions cannot both win.
    async fn transition_chore(&self, chore: &Chore, expected: ChoreStatus) -> Result<bool>;

    async fn delete_chore(&self, chore_id: &str) -> Result<()>;
}

/// Storage for the points ledger. Entries are append-only: the only
/// mutation is the one-shot claim transition.
#[async_trait]
pub trait PointEntryStore: Send + Sync {
    async fn store_entry(&self, entry: &PointEntry) -> Result<()>;

    /// Fetch entries by id, restricted to one kid. Ids that do not
    /// exist or belong to another kid are simply absent from the
    /// result.
    async fn get_entries_by_ids(&self, kid_id: &str, entry_ids: &[String]) -> Result<Vec<PointEntry>>;

    /// All entries for a kid, newest first.
    async fn list_entries(&self, kid_id: &str) -> Result<Vec<PointEntry>>;

    /// Claimable entries for a kid, newest first (display order).
    async fn list_claimable(&self, kid_id: &str) -> Result<Vec<PointEntry>>;

    /// Claimable entries for a kid, oldest earned first. This is the
    /// order the redemption allocator consumes in.
    async fn list_claimable_chronological(&self, kid_id: &str) -> Result<Vec<PointEntry>>;

    /// Claimed entries carrying a reward reference, for redemption
    /// history reconstruction.
    async fn list_redeemed(&self, kid_id: &str) -> Result<Vec<PointEntry>>;

    /// Atomically mark a batch of entries claimed with one shared
    /// timestamp (and reward reference, for redemptions). All-or-
    /// nothing: returns false and changes nothing if any entry is not
    /// claimable at commit time.
    async fn claim_entries(
        &self,
        entry_ids: &[String],
        claimed_at: &str,
        reward_id: Option<&str>,
    ) -> Result<bool>;
}

/// Storage for rewards.
#[async_trait]
pub trait RewardStore: Send + Sync {
    async fn store_reward(&self, reward: &Reward) -> Result<()>;

    async fn get_reward(&self, reward_id: &str) -> Result<Option<Reward>>;

    /// All of a parent's rewards, newest first.
    async fn list_rewards(&self, parent_id: &str) -> Result<Vec<Reward>>;

    /// Active rewards only, cheapest first.
    async fn list_active_rewards(&self, parent_id: &str) -> Result<Vec<Reward>>;

    async fn update_reward(&self, reward: &Reward) -> Result<()>;

    async fn delete_reward(&self, reward_id: &str) -> Result<()>;
}

/// Factory for repositories bound to one storage backend, so services
/// can be written once and instantiated against any implementation.
pub trait Connection: Send + Sync + Clone + 'static {
    type UserRepository: UserStore + Clone + 'static;
    type KidRepository: KidStore + Clone + 'static;
    type ChoreRepository: ChoreStore + Clone + 'static;
    type PointEntryRepository: PointEntryStore + Clone + 'static;
    type RewardRepository: RewardStore + Clone + 'static;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_kid_repository(&self) -> Self::KidRepository;
    fn create_chore_repository(&self) -> Self::ChoreRepository;
    fn create_point_entry_repository(&self) -> Self::PointEntryRepository;
    fn create_reward_repository(&self) -> Self::RewardRepository;
}
