use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a user account. The set is closed on purpose: every policy
/// check matches exhaustively, so adding a role forces every check site
/// to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "parent" => Some(Role::Parent),
            "child" => Some(Role::Child),
            _ => None,
        }
    }
}

/// A login account. Credentials (passwords, tokens) are handled by the
/// identity provider and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl User {
    pub fn generate_id() -> String {
        format!("user::{}", Uuid::new_v4())
    }
}

/// A child profile, owned by exactly one parent and linked to its own
/// login account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kid {
    pub id: String,
    pub name: String,
    /// ISO 8601 date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    /// Owning parent's user id. Immutable after creation.
    pub parent_id: String,
    /// Linked login account id for this kid.
    pub user_id: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Kid {
    pub fn generate_id() -> String {
        format!("kid::{}", Uuid::new_v4())
    }
}

/// Lifecycle status of a chore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoreStatus {
    /// Parent created the chore; nobody has started it yet.
    Created,
    /// A kid is working on it.
    Started,
    /// Submitted for parent review.
    Finished,
    /// Parent accepted the work; points were granted.
    Approved,
    /// Parent sent it back; the kid can start again.
    Redo,
    /// Parent rejected the work. No rule reopens a rejected chore.
    Rejected,
}

impl ChoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoreStatus::Created => "created",
            ChoreStatus::Started => "started",
            ChoreStatus::Finished => "finished",
            ChoreStatus::Approved => "approved",
            ChoreStatus::Redo => "redo",
            ChoreStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ChoreStatus> {
        match s {
            "created" => Some(ChoreStatus::Created),
            "started" => Some(ChoreStatus::Started),
            "finished" => Some(ChoreStatus::Finished),
            "approved" => Some(ChoreStatus::Approved),
            "redo" => Some(ChoreStatus::Redo),
            "rejected" => Some(ChoreStatus::Rejected),
            _ => None,
        }
    }
}

/// A task owned by a parent, assignable to one or more kids, worth a
/// fixed point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chore {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ChoreStatus,
    /// Points granted per assigned kid when the chore is approved.
    /// Non-negative; zero means approval grants nothing.
    pub points: i64,
    /// RFC 3339 timestamp of the first transition to Started. Never
    /// reset by later redo cycles.
    pub date_started: Option<String>,
    /// Opaque reference into the photo store.
    pub photo: Option<String>,
    /// Owning parent's user id. Immutable after creation.
    pub parent_id: String,
    /// Kids this chore is assigned to. Always a subset of the kids
    /// owned by `parent_id`.
    pub assigned_kid_ids: Vec<String>,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Chore {
    pub fn generate_id() -> String {
        format!("chore::{}", Uuid::new_v4())
    }
}

/// Claim state of a point entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    /// Earned but not yet claimed or spent.
    Claimable,
    /// Claimed directly or consumed by a redemption.
    Claimed,
}

impl PointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointStatus::Claimable => "claimable",
            PointStatus::Claimed => "claimed",
        }
    }

    pub fn parse(s: &str) -> Option<PointStatus> {
        match s {
            "claimable" => Some(PointStatus::Claimable),
            "claimed" => Some(PointStatus::Claimed),
            _ => None,
        }
    }
}

/// An append-only ledger record of points earned by a kid. Entries are
/// never deleted; claiming sets `status`, `claimed_at` and (for
/// redemptions) `reward_id` exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEntry {
    pub id: String,
    pub kid_id: String,
    /// Always positive.
    pub amount: i64,
    pub status: PointStatus,
    /// How the points were earned, e.g. "Completed: Dishes".
    pub description: String,
    /// Source chore, if the points came from an approval.
    pub chore_id: Option<String>,
    /// Reward that consumed this entry, if it was spent in a redemption.
    pub reward_id: Option<String>,
    /// RFC 3339 timestamp
    pub earned_at: String,
    /// RFC 3339 timestamp. Set if and only if status is Claimed.
    pub claimed_at: Option<String>,
}

impl PointEntry {
    pub fn generate_id() -> String {
        format!("point::{}", Uuid::new_v4())
    }
}

/// A parent-defined redeemable item with a fixed point cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Always positive.
    pub points_cost: i64,
    pub is_active: bool,
    /// Owning parent's user id. Immutable after creation.
    pub parent_id: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Reward {
    pub fn generate_id() -> String {
        format!("reward::{}", Uuid::new_v4())
    }
}

// ---------------------------------------------------------------------------
// Kid requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateKidRequest {
    pub name: String,
    /// ISO 8601 date (YYYY-MM-DD)
    pub date_of_birth: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateKidRequest {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub notes: Option<String>,
    pub active: Option<bool>,
}

/// Response after creating a kid. Includes the generated login email so
/// the parent can hand it to the kid; the credential itself is issued by
/// the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateKidResponse {
    pub kid: Kid,
    pub login_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidListResponse {
    pub kids: Vec<Kid>,
}

// ---------------------------------------------------------------------------
// Chore requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChoreRequest {
    pub title: String,
    pub description: String,
    /// Defaults to zero when omitted.
    pub points: Option<i64>,
    /// Kids to assign immediately. All must belong to the caller.
    pub kid_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateChoreRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeChoreStatusRequest {
    pub status: ChoreStatus,
    /// Optional photo reference recorded alongside the transition,
    /// typically proof submitted with Finished.
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignKidsRequest {
    pub kid_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreListResponse {
    pub chores: Vec<Chore>,
}

// ---------------------------------------------------------------------------
// Points requests/responses
// ---------------------------------------------------------------------------

/// Claimable entries plus their total, recomputed from the entries on
/// every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailablePointsResponse {
    pub entries: Vec<PointEntry>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsHistoryResponse {
    pub entries: Vec<PointEntry>,
    pub total_earned: i64,
    pub total_claimed: i64,
    pub total_available: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimPointsRequest {
    pub entry_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimPointsResponse {
    pub claimed: Vec<PointEntry>,
    pub total_claimed: i64,
}

// ---------------------------------------------------------------------------
// Reward requests/responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRewardRequest {
    pub title: String,
    pub description: String,
    pub points_cost: i64,
    /// Defaults to true when omitted.
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRewardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub points_cost: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardListResponse {
    pub rewards: Vec<Reward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRewardRequest {
    pub reward_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemRewardResponse {
    pub reward: Reward,
    /// The reward's cost. Consumed entries may sum to more; the surplus
    /// is not refunded.
    pub points_used: i64,
    /// Claimable total remaining after the redemption, recomputed.
    pub remaining_points: i64,
    pub consumed: Vec<PointEntry>,
}

/// One past redemption, reconstructed from the ledger rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Redemption {
    pub reward: Reward,
    pub entries: Vec<PointEntry>,
    pub total_points_used: i64,
    /// Earliest claimed_at among the grouped entries.
    pub redeemed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionHistoryResponse {
    pub redemptions: Vec<Redemption>,
    pub total_redemptions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_entity_prefix() {
        assert!(User::generate_id().starts_with("user::"));
        assert!(Kid::generate_id().starts_with("kid::"));
        assert!(Chore::generate_id().starts_with("chore::"));
        assert!(PointEntry::generate_id().starts_with("point::"));
        assert!(Reward::generate_id().starts_with("reward::"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = PointEntry::generate_id();
        let b = PointEntry::generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_chore_status_round_trip() {
        let all = [
            ChoreStatus::Created,
            ChoreStatus::Started,
            ChoreStatus::Finished,
            ChoreStatus::Approved,
            ChoreStatus::Redo,
            ChoreStatus::Rejected,
        ];
        for status in all {
            assert_eq!(ChoreStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ChoreStatus::parse("paused"), None);
    }

    #[test]
    fn test_point_status_round_trip() {
        assert_eq!(PointStatus::parse("claimable"), Some(PointStatus::Claimable));
        assert_eq!(PointStatus::parse("claimed"), Some(PointStatus::Claimed));
        assert_eq!(PointStatus::parse(""), None);
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("parent"), Some(Role::Parent));
        assert_eq!(Role::parse("child"), Some(Role::Child));
        assert_eq!(Role::parse("admin"), None);
    }
}
