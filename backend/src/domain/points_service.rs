//! Points ledger domain logic.
//!
//! The ledger is append-only: grants create claimable entries, claims
//! and redemptions flip them to claimed exactly once, and every total
//! is recomputed from the entries so a cached balance can never drift
//! from the records that justify it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    AvailablePointsResponse, ClaimPointsRequest, ClaimPointsResponse, PointEntry, PointStatus,
    PointsHistoryResponse,
};
use tracing::info;

use crate::domain::access_policy::AccessPolicy;
use crate::domain::errors::DomainError;
use crate::storage::{Connection, KidStore, PointEntryStore};

/// Grant seam between the chore state machine and the ledger. The
/// chore service always holds one of these; deployments that do not
/// track points wire in [`NoopPointAwarder`] instead of an `Option`.
#[async_trait]
pub trait PointAwarder: Send + Sync {
    async fn award_points(
        &self,
        kid_id: &str,
        amount: i64,
        chore_id: &str,
        description: &str,
    ) -> Result<(), DomainError>;
}

/// Awarder that records nothing.
#[derive(Clone, Default)]
pub struct NoopPointAwarder;

#[async_trait]
impl PointAwarder for NoopPointAwarder {
    async fn award_points(
        &self,
        _kid_id: &str,
        _amount: i64,
        _chore_id: &str,
        _description: &str,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct PointsService<C: Connection> {
    point_repository: C::PointEntryRepository,
    kid_repository: C::KidRepository,
    policy: AccessPolicy<C>,
}

impl<C: Connection> PointsService<C> {
    pub fn new(connection: Arc<C>, policy: AccessPolicy<C>) -> Self {
        Self {
            point_repository: connection.create_point_entry_repository(),
            kid_repository: connection.create_kid_repository(),
            policy,
        }
    }

    /// Claimable entries for the calling kid plus their total.
    pub async fn available_points(&self, user_id: &str) -> Result<AvailablePointsResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;

        let entries = self
            .point_repository
            .list_claimable(&kid.id)
            .await
            .map_err(DomainError::storage)?;
        let total = entries.iter().map(|e| e.amount).sum();

        Ok(AvailablePointsResponse { entries, total })
    }

    /// Full ledger for the calling kid with earned/claimed/available
    /// totals.
    pub async fn points_history(&self, user_id: &str) -> Result<PointsHistoryResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;
        self.history_for(&kid.id).await
    }

    /// Parent view of an owned kid's ledger.
    pub async fn kid_points(&self, kid_id: &str, user_id: &str) -> Result<PointsHistoryResponse, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;

        let kid = self
            .kid_repository
            .get_kid(kid_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("kid not found".into()))?;
        if kid.parent_id != parent.id {
            return Err(DomainError::Forbidden("this kid does not belong to you".into()));
        }

        self.history_for(&kid.id).await
    }

    /// Claim a caller-supplied set of entries. All-or-nothing: every id
    /// must exist, belong to the calling kid and be claimable, or the
    /// whole request fails and nothing changes.
    pub async fn claim_points(
        &self,
        request: ClaimPointsRequest,
        user_id: &str,
    ) -> Result<ClaimPointsResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;

        let entries = self
            .point_repository
            .get_entries_by_ids(&kid.id, &request.entry_ids)
            .await
            .map_err(DomainError::storage)?;

        if entries.len() != request.entry_ids.len() {
            return Err(DomainError::NotFound(
                "one or more point entries not found or do not belong to you".into(),
            ));
        }
        if entries.iter().any(|e| e.status != PointStatus::Claimable) {
            return Err(DomainError::AlreadyClaimed(
                "some of these points have already been claimed".into(),
            ));
        }

        self.mark_claimed(entries).await
    }

    /// Claim every currently claimable entry for the calling kid.
    pub async fn claim_all_points(&self, user_id: &str) -> Result<ClaimPointsResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;

        let entries = self
            .point_repository
            .list_claimable(&kid.id)
            .await
            .map_err(DomainError::storage)?;
        if entries.is_empty() {
            return Err(DomainError::NothingToClaim);
        }

        self.mark_claimed(entries).await
    }

    async fn mark_claimed(&self, entries: Vec<PointEntry>) -> Result<ClaimPointsResponse, DomainError> {
        let claimed_at = Utc::now().to_rfc3339();
        let entry_ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();

        let claimed_all = self
            .point_repository
            .claim_entries(&entry_ids, &claimed_at, None)
            .await
            .map_err(DomainError::storage)?;
        if !claimed_all {
            return Err(DomainError::AlreadyClaimed(
                "some of these points were claimed by another request".into(),
            ));
        }

        let claimed: Vec<PointEntry> = entries
            .into_iter()
            .map(|mut entry| {
                entry.status = PointStatus::Claimed;
                entry.claimed_at = Some(claimed_at.clone());
                entry
            })
            .collect();
        let total_claimed = claimed.iter().map(|e| e.amount).sum();

        info!("Claimed {} point entries worth {}", claimed.len(), total_claimed);

        Ok(ClaimPointsResponse { claimed, total_claimed })
    }

    async fn history_for(&self, kid_id: &str) -> Result<PointsHistoryResponse, DomainError> {
        let entries = self
            .point_repository
            .list_entries(kid_id)
            .await
            .map_err(DomainError::storage)?;

        let total_earned = entries.iter().map(|e| e.amount).sum();
        let total_claimed = entries
            .iter()
            .filter(|e| e.status == PointStatus::Claimed)
            .map(|e| e.amount)
            .sum();
        let total_available = entries
            .iter()
            .filter(|e| e.status == PointStatus::Claimable)
            .map(|e| e.amount)
            .sum();

        Ok(PointsHistoryResponse {
            entries,
            total_earned,
            total_claimed,
            total_available,
        })
    }
}

#[async_trait]
impl<C: Connection> PointAwarder for PointsService<C> {
    /// Append a claimable entry to the kid's ledger. Zero and negative
    /// amounts are refused; callers granting for a zero-point chore
    /// must simply not call this.
    async fn award_points(
        &self,
        kid_id: &str,
        amount: i64,
        chore_id: &str,
        description: &str,
    ) -> Result<(), DomainError> {
        if amount <= 0 {
            return Err(DomainError::InvalidAmount(
                "point grants must be a positive amount".into(),
            ));
        }

        let entry = PointEntry {
            id: PointEntry::generate_id(),
            kid_id: kid_id.to_string(),
            amount,
            status: PointStatus::Claimable,
            description: description.to_string(),
            chore_id: Some(chore_id.to_string()),
            reward_id: None,
            earned_at: Utc::now().to_rfc3339(),
            claimed_at: None,
        };

        self.point_repository
            .store_entry(&entry)
            .await
            .map_err(DomainError::storage)?;

        info!("Granted {} points to {} for {}", amount, kid_id, chore_id);
        Ok(())
    }
}
