//! SQLite storage backend.
//!
//! One pool shared by all repositories, schema bootstrapped on connect,
//! runtime queries with explicit binds.

mod chore_repository;
mod db;
mod kid_repository;
mod point_repository;
mod reward_repository;
mod user_repository;

pub use chore_repository::ChoreRepository;
pub use db::SqliteConnection;
pub use kid_repository::KidRepository;
pub use point_repository::PointRepository;
pub use reward_repository::RewardRepository;
pub use user_repository::UserRepository;
