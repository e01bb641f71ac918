//! Reward catalogue and redemption allocator.
//!
//! Redeeming consumes claimable ledger entries oldest-first, whole
//! entries only: the last entry needed to cover the cost is consumed
//! entirely even when it overshoots, and the surplus is not refunded.
//! Redemption history is never stored; it is rebuilt from the claimed
//! entries that carry a reward reference.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    CreateRewardRequest, PointEntry, PointStatus, RedeemRewardRequest, RedeemRewardResponse,
    Redemption, RedemptionHistoryResponse, Reward, RewardListResponse, UpdateRewardRequest,
};
use tracing::{info, warn};

use crate::domain::access_policy::{AccessPolicy, Actor};
use crate::domain::errors::DomainError;
use crate::storage::{Connection, KidStore, PointEntryStore, RewardStore};

#[derive(Clone)]
pub struct RewardsService<C: Connection> {
    reward_repository: C::RewardRepository,
    point_repository: C::PointEntryRepository,
    kid_repository: C::KidRepository,
    policy: AccessPolicy<C>,
}

impl<C: Connection> RewardsService<C> {
    pub fn new(connection: Arc<C>, policy: AccessPolicy<C>) -> Self {
        Self {
            reward_repository: connection.create_reward_repository(),
            point_repository: connection.create_point_entry_repository(),
            kid_repository: connection.create_kid_repository(),
            policy,
        }
    }

    pub async fn create_reward(
        &self,
        request: CreateRewardRequest,
        user_id: &str,
    ) -> Result<Reward, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;

        if request.points_cost <= 0 {
            return Err(DomainError::InvalidAmount(
                "reward cost must be a positive amount".into(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let reward = Reward {
            id: Reward::generate_id(),
            title: request.title,
            description: request.description,
            points_cost: request.points_cost,
            is_active: request.is_active.unwrap_or(true),
            parent_id: parent.id,
            created_at: now.clone(),
            updated_at: now,
        };

        self.reward_repository
            .store_reward(&reward)
            .await
            .map_err(DomainError::storage)?;

        info!("Created reward {} ({})", reward.id, reward.title);
        Ok(reward)
    }

    /// All rewards of the caller's family: a parent sees their own, a
    /// kid sees their parent's.
    pub async fn list_rewards(&self, user_id: &str) -> Result<RewardListResponse, DomainError> {
        let parent_id = self.family_parent_id(user_id).await?;
        let rewards = self
            .reward_repository
            .list_rewards(&parent_id)
            .await
            .map_err(DomainError::storage)?;
        Ok(RewardListResponse { rewards })
    }

    pub async fn list_active_rewards(&self, user_id: &str) -> Result<RewardListResponse, DomainError> {
        let parent_id = self.family_parent_id(user_id).await?;
        let rewards = self
            .reward_repository
            .list_active_rewards(&parent_id)
            .await
            .map_err(DomainError::storage)?;
        Ok(RewardListResponse { rewards })
    }

    pub async fn get_reward(&self, reward_id: &str, user_id: &str) -> Result<Reward, DomainError> {
        let parent_id = self.family_parent_id(user_id).await?;
        let reward = self.load_reward(reward_id).await?;
        if reward.parent_id != parent_id {
            return Err(DomainError::Forbidden(
                "you do not have access to this reward".into(),
            ));
        }
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        reward_id: &str,
        request: UpdateRewardRequest,
        user_id: &str,
    ) -> Result<Reward, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let mut reward = self.load_reward(reward_id).await?;
        if reward.parent_id != parent.id {
            return Err(DomainError::Forbidden(
                "you can only update your own rewards".into(),
            ));
        }

        if let Some(title) = request.title {
            reward.title = title;
        }
        if let Some(description) = request.description {
            reward.description = description;
        }
        if let Some(points_cost) = request.points_cost {
            if points_cost <= 0 {
                return Err(DomainError::InvalidAmount(
                    "reward cost must be a positive amount".into(),
                ));
            }
            reward.points_cost = points_cost;
        }
        if let Some(is_active) = request.is_active {
            reward.is_active = is_active;
        }
        reward.updated_at = Utc::now().to_rfc3339();

        self.reward_repository
            .update_reward(&reward)
            .await
            .map_err(DomainError::storage)?;
        Ok(reward)
    }

    pub async fn delete_reward(&self, reward_id: &str, user_id: &str) -> Result<(), DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let reward = self.load_reward(reward_id).await?;
        if reward.parent_id != parent.id {
            return Err(DomainError::Forbidden(
                "you can only delete your own rewards".into(),
            ));
        }

        self.reward_repository
            .delete_reward(&reward.id)
            .await
            .map_err(DomainError::storage)?;
        Ok(())
    }

    /// Kid redeems a reward against their claimable entries.
    pub async fn redeem_reward(
        &self,
        request: RedeemRewardRequest,
        user_id: &str,
    ) -> Result<RedeemRewardResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;

        let reward = self.load_reward(&request.reward_id).await?;
        if reward.parent_id != kid.parent_id {
            return Err(DomainError::Forbidden(
                "this reward does not belong to your family".into(),
            ));
        }
        if !reward.is_active {
            return Err(DomainError::NotFound(
                "this reward is no longer available".into(),
            ));
        }

        let available = self
            .point_repository
            .list_claimable_chronological(&kid.id)
            .await
            .map_err(DomainError::storage)?;
        let total_available: i64 = available.iter().map(|e| e.amount).sum();
        if total_available < reward.points_cost {
            return Err(DomainError::InsufficientPoints {
                available: total_available,
                required: reward.points_cost,
            });
        }

        // Oldest entries first, whole entries only. The final entry may
        // overshoot the cost; it is still consumed in full.
        let mut consumed: Vec<PointEntry> = Vec::new();
        let mut covered = 0;
        for entry in available {
            if covered >= reward.points_cost {
                break;
            }
            covered += entry.amount;
            consumed.push(entry);
        }

        let claimed_at = Utc::now().to_rfc3339();
        let consumed_ids: Vec<String> = consumed.iter().map(|e| e.id.clone()).collect();
        let claimed_all = self
            .point_repository
            .claim_entries(&consumed_ids, &claimed_at, Some(&reward.id))
            .await
            .map_err(DomainError::storage)?;
        if !claimed_all {
            return Err(DomainError::AlreadyClaimed(
                "some of these points were claimed by another request".into(),
            ));
        }

        for entry in &mut consumed {
            entry.status = PointStatus::Claimed;
            entry.claimed_at = Some(claimed_at.clone());
            entry.reward_id = Some(reward.id.clone());
        }

        let remaining = self
            .point_repository
            .list_claimable(&kid.id)
            .await
            .map_err(DomainError::storage)?;
        let remaining_points = remaining.iter().map(|e| e.amount).sum();

        info!(
            "Kid {} redeemed {} for {} points ({} consumed)",
            kid.id, reward.id, reward.points_cost, covered
        );

        // points_used reports the reward's price; the consumed sum may
        // be higher and the surplus is not refunded.
        let points_used = reward.points_cost;
        Ok(RedeemRewardResponse {
            reward,
            points_used,
            remaining_points,
            consumed,
        })
    }

    /// Kid's own redemption history, reconstructed from the ledger.
    pub async fn redemption_history(
        &self,
        user_id: &str,
    ) -> Result<RedemptionHistoryResponse, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;
        self.history_for(&kid.id).await
    }

    /// Parent view of an owned kid's redemption history.
    pub async fn kid_redemption_history(
        &self,
        kid_id: &str,
        user_id: &str,
    ) -> Result<RedemptionHistoryResponse, DomainError> {
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

    async fn history_for(&self, kid_id: &str) -> Result<RedemptionHistoryResponse, DomainError> {
        let entries = self
            .point_repository
            .list_redeemed(kid_id)
            .await
            .map_err(DomainError::storage)?;

        // Group by reward, keeping the newest-first order the entries
        // arrive in.
        let mut groups: Vec<(String, Vec<PointEntry>)> = Vec::new();
        for entry in entries {
            let Some(reward_id) = entry.reward_id.clone() else {
                continue;
            };
            match groups.iter_mut().find(|(id, _)| *id == reward_id) {
                Some((_, group)) => group.push(entry),
                None => groups.push((reward_id, vec![entry])),
            }
        }

        let mut redemptions = Vec::with_capacity(groups.len());
        for (reward_id, group) in groups {
            let Some(reward) = self
                .reward_repository
                .get_reward(&reward_id)
                .await
                .map_err(DomainError::storage)?
            else {
                warn!("Redeemed entries reference missing reward {}", reward_id);
                continue;
            };

            let total_points_used = group.iter().map(|e| e.amount).sum();
            // One redemption stamps every entry with the same
            // claimed_at, but the read path still takes the minimum.
            let redeemed_at = group
                .iter()
                .filter_map(|e| e.claimed_at.clone())
                .min()
                .unwrap_or_default();

            redemptions.push(Redemption {
                reward,
                entries: group,
                total_points_used,
                redeemed_at,
            });
        }

        let total_redemptions = redemptions.len();
        Ok(RedemptionHistoryResponse {
            redemptions,
            total_redemptions,
        })
    }

    async fn load_reward(&self, reward_id: &str) -> Result<Reward, DomainError> {
        self.reward_repository
            .get_reward(reward_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("reward not found".into()))
    }

    /// The parent id whose catalogue the caller may see.
    async fn family_parent_id(&self, user_id: &str) -> Result<String, DomainError> {
        match self.policy.resolve(user_id).await? {
            Actor::Parent(user) => Ok(user.id),
            Actor::Child { kid, .. } => Ok(kid.parent_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{seed_entry, seed_kid, seed_parent, seed_reward, setup};

    #[tokio::test]
    async fn test_create_reward_validations() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        let err = env
            .rewards_service
            .create_reward(
                CreateRewardRequest {
                    title: "Movie night".into(),
                    description: String::new(),
                    points_cost: 0,
                    is_active: None,
                },
                &parent.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));

        let err = env
            .rewards_service
            .create_reward(
                CreateRewardRequest {
                    title: "Movie night".into(),
                    description: String::new(),
                    points_cost: 10,
                    is_active: None,
                },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_redeem_consumes_whole_entries_fifo() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 10, "2024-03-01T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 10, "2024-03-02T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 15, "2024-03-03T12:00:00+00:00").await;
        let reward = seed_reward(&env, &parent, "Movie night", 30).await;

        let response = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: reward.id.clone() },
                &kid.user_id,
            )
            .await
            .unwrap();

        // 10 + 10 + 15 = 35 >= 30: all three entries go, nothing is
        // split, the 5-point surplus is gone.
        assert_eq!(response.points_used, 30);
        assert_eq!(response.remaining_points, 0);
        assert_eq!(response.consumed.len(), 3);
        for entry in &response.consumed {
            assert_eq!(entry.status, PointStatus::Claimed);
            assert_eq!(entry.reward_id.as_deref(), Some(reward.id.as_str()));
            assert!(entry.claimed_at.is_some());
        }

        let available = env.points_service.available_points(&kid.user_id).await.unwrap();
        assert!(available.entries.is_empty());
    }

    #[tokio::test]
    async fn test_redeem_stops_once_covered() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 10, "2024-03-01T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 10, "2024-03-02T12:00:00+00:00").await;
        let newest = seed_entry(&env, &kid.id, 15, "2024-03-03T12:00:00+00:00").await;
        let reward = seed_reward(&env, &parent, "Comic book", 15).await;

        let response = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: reward.id },
                &kid.user_id,
            )
            .await
            .unwrap();

        // The two oldest tens cover the cost of 15; the newest entry
        // survives untouched.
        assert_eq!(response.points_used, 15);
        assert_eq!(response.consumed.len(), 2);
        assert_eq!(response.remaining_points, 15);

        let available = env.points_service.available_points(&kid.user_id).await.unwrap();
        assert_eq!(available.entries.len(), 1);
        assert_eq!(available.entries[0].id, newest.id);
    }

    #[tokio::test]
    async fn test_redeem_insufficient_points_changes_nothing() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 10, "2024-03-01T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 20, "2024-03-02T12:00:00+00:00").await;
        let reward = seed_reward(&env, &parent, "Bike", 50).await;

        let err = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: reward.id },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientPoints { available: 30, required: 50 }
        ));

        let available = env.points_service.available_points(&kid.user_id).await.unwrap();
        assert_eq!(available.total, 30);
        assert_eq!(available.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_redeem_rejects_inactive_and_foreign_rewards() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 100, "2024-03-01T12:00:00+00:00").await;

        let inactive = env
            .rewards_service
            .create_reward(
                CreateRewardRequest {
                    title: "Retired".into(),
                    description: String::new(),
                    points_cost: 10,
                    is_active: Some(false),
                },
                &parent.id,
            )
            .await
            .unwrap();
        let err = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: inactive.id },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let foreign = seed_reward(&env, &other, "Other family's", 10).await;
        let err = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: foreign.id },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = env
            .rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: "reward::missing".into() },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_redeem_requires_child() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let reward = seed_reward(&env, &parent, "Movie night", 10).await;

        let err = env
            .rewards_service
            .redeem_reward(RedeemRewardRequest { reward_id: reward.id }, &parent.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_redemption_history_groups_by_reward() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 10, "2024-03-01T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 10, "2024-03-02T12:00:00+00:00").await;
        seed_entry(&env, &kid.id, 25, "2024-03-03T12:00:00+00:00").await;
        let movie = seed_reward(&env, &parent, "Movie night", 15).await;
        let comic = seed_reward(&env, &parent, "Comic book", 25).await;

        env.rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: movie.id.clone() },
                &kid.user_id,
            )
            .await
            .unwrap();
        env.rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: comic.id.clone() },
                &kid.user_id,
            )
            .await
            .unwrap();

        let history = env
            .rewards_service
            .redemption_history(&kid.user_id)
            .await
            .unwrap();

        assert_eq!(history.total_redemptions, 2);
        let movie_group = history
            .redemptions
            .iter()
            .find(|r| r.reward.id == movie.id)
            .unwrap();
        assert_eq!(movie_group.total_points_used, 20);
        assert_eq!(movie_group.entries.len(), 2);
        assert_eq!(
            movie_group.redeemed_at,
            movie_group
                .entries
                .iter()
                .filter_map(|e| e.claimed_at.clone())
                .min()
                .unwrap()
        );

        let comic_group = history
            .redemptions
            .iter()
            .find(|r| r.reward.id == comic.id)
            .unwrap();
        assert_eq!(comic_group.total_points_used, 25);
        assert_eq!(comic_group.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_plain_claims_never_show_in_redemption_history() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 10, "2024-03-01T12:00:00+00:00").await;

        env.points_service.claim_all_points(&kid.user_id).await.unwrap();

        let history = env
            .rewards_service
            .redemption_history(&kid.user_id)
            .await
            .unwrap();
        assert_eq!(history.total_redemptions, 0);
    }

    #[tokio::test]
    async fn test_kid_redemption_history_parent_view() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        seed_entry(&env, &kid.id, 20, "2024-03-01T12:00:00+00:00").await;
        let reward = seed_reward(&env, &parent, "Movie night", 20).await;

        env.rewards_service
            .redeem_reward(
                RedeemRewardRequest { reward_id: reward.id },
                &kid.user_id,
            )
            .await
            .unwrap();

        let history = env
            .rewards_service
            .kid_redemption_history(&kid.id, &parent.id)
            .await
            .unwrap();
        assert_eq!(history.total_redemptions, 1);

        let err = env
            .rewards_service
            .kid_redemption_history(&kid.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reward_catalogue_visibility_and_ownership() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let reward = seed_reward(&env, &parent, "Movie night", 10).await;
        let _retired = env
            .rewards_service
            .create_reward(
                CreateRewardRequest {
                    title: "Retired".into(),
                    description: String::new(),
                    points_cost: 5,
                    is_active: Some(false),
                },
                &parent.id,
            )
            .await
            .unwrap();
        seed_reward(&env, &other, "Not yours", 10).await;

        let all = env.rewards_service.list_rewards(&kid.user_id).await.unwrap();
        assert_eq!(all.rewards.len(), 2);

        let active = env
            .rewards_service
            .list_active_rewards(&kid.user_id)
            .await
            .unwrap();
        assert_eq!(active.rewards.len(), 1);
        assert_eq!(active.rewards[0].id, reward.id);

        let err = env
            .rewards_service
            .update_reward(
                &reward.id,
                UpdateRewardRequest {
                    title: None,
                    description: None,
                    points_cost: Some(12),
                    is_active: None,
                },
                &other.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = env
            .rewards_service
            .delete_reward(&reward.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let updated = env
            .rewards_service
            .update_reward(
                &reward.id,
                UpdateRewardRequest {
                    title: None,
                    description: None,
                    points_cost: Some(12),
                    is_active: None,
                },
                &parent.id,
            )
            .await
            .unwrap();
        assert_eq!(updated.points_cost, 12);

        env.rewards_service.delete_reward(&reward.id, &parent.id).await.unwrap();
        let err = env
            .rewards_service
            .get_reward(&reward.id, &parent.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
