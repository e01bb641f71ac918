//! Chore lifecycle domain logic.
//!
//! A chore moves `Created → Started → Finished`, then the parent
//! settles it with `Approved`, `Redo` or `Rejected`. `Redo` loops back
//! through `Started`; `Approved` triggers the point grant; `Rejected`
//! has no reopen rule and stays where it is.

use std::sync::Arc;

use chrono::Utc;
use shared::{
    AssignKidsRequest, ChangeChoreStatusRequest, Chore, ChoreListResponse, ChoreStatus,
    CreateChoreRequest, Role, UpdateChoreRequest,
};
use tracing::{info, warn};

use crate::domain::access_policy::{AccessPolicy, Actor};
use crate::domain::errors::DomainError;
use crate::domain::points_service::PointAwarder;
use crate::storage::{ChoreStore, Connection, KidStore, PhotoStore};

/// Check a requested transition against the rule table. The role gate
/// comes first: a target status the caller's role can never set is
/// `Forbidden` regardless of the current status, and only then is the
/// source-status precondition checked.
pub fn validate_transition(
    role: Role,
    current: ChoreStatus,
    target: ChoreStatus,
) -> Result<(), DomainError> {
    match role {
        Role::Parent => {
            if !matches!(
                target,
                ChoreStatus::Approved | ChoreStatus::Redo | ChoreStatus::Rejected
            ) {
                return Err(DomainError::Forbidden(
                    "parents can only approve, redo, or reject chores".into(),
                ));
            }
            if current != ChoreStatus::Finished {
                return Err(DomainError::invalid_transition(role, current, target));
            }
        }
        Role::Child => {
            if !matches!(target, ChoreStatus::Started | ChoreStatus::Finished) {
                return Err(DomainError::Forbidden(
                    "kids can only start or finish chores".into(),
                ));
            }
            let allowed = match target {
                ChoreStatus::Started => {
                    matches!(current, ChoreStatus::Created | ChoreStatus::Redo)
                }
                ChoreStatus::Finished => current == ChoreStatus::Started,
                _ => false,
            };
            if !allowed {
                return Err(DomainError::invalid_transition(role, current, target));
            }
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ChoreService<C: Connection> {
    chore_repository: C::ChoreRepository,
    kid_repository: C::KidRepository,
    policy: AccessPolicy<C>,
    photo_store: Arc<dyn PhotoStore>,
    point_awarder: Arc<dyn PointAwarder>,
}

impl<C: Connection> ChoreService<C> {
    pub fn new(
        connection: Arc<C>,
        policy: AccessPolicy<C>,
        photo_store: Arc<dyn PhotoStore>,
        point_awarder: Arc<dyn PointAwarder>,
    ) -> Self {
        Self {
            chore_repository: connection.create_chore_repository(),
            kid_repository: connection.create_kid_repository(),
            policy,
            photo_store,
            point_awarder,
        }
    }

    /// Parent creates a chore, optionally assigning kids immediately.
    pub async fn create_chore(
        &self,
        request: CreateChoreRequest,
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;

        let points = request.points.unwrap_or(0);
        if points < 0 {
            return Err(DomainError::InvalidAmount(
                "chore points must not be negative".into(),
            ));
        }

        let assigned_kid_ids = match request.kid_ids {
            Some(kid_ids) => self.verify_owned_kids(&parent.id, &kid_ids).await?,
            None => Vec::new(),
        };

        let now = Utc::now().to_rfc3339();
        let chore = Chore {
            id: Chore::generate_id(),
            title: request.title,
            description: request.description,
            status: ChoreStatus::Created,
            points,
            date_started: None,
            photo: None,
            parent_id: parent.id,
            assigned_kid_ids,
            created_at: now.clone(),
            updated_at: now,
        };

        self.chore_repository
            .store_chore(&chore)
            .await
            .map_err(DomainError::storage)?;

        info!("Created chore {} ({})", chore.id, chore.title);
        Ok(chore)
    }

    /// Parent sees all chores they created; kid sees only chores
    /// assigned to them.
    pub async fn list_chores(&self, user_id: &str) -> Result<ChoreListResponse, DomainError> {
        let actor = self.policy.resolve(user_id).await?;

        let chores = match &actor {
            Actor::Parent(user) => self
                .chore_repository
                .list_chores_by_parent(&user.id)
                .await
                .map_err(DomainError::storage)?,
            Actor::Child { kid, .. } => self
                .chore_repository
                .list_chores_by_kid(&kid.id)
                .await
                .map_err(DomainError::storage)?,
        };

        Ok(ChoreListResponse { chores })
    }

    pub async fn get_chore(&self, chore_id: &str, user_id: &str) -> Result<Chore, DomainError> {
        let actor = self.policy.resolve(user_id).await?;
        self.chore_for_actor(chore_id, &actor).await
    }

    /// Parent edits title, description or point value. Identity, owner
    /// and status are never touched here.
    pub async fn update_chore(
        &self,
        chore_id: &str,
        request: UpdateChoreRequest,
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let mut chore = self.owned_chore(chore_id, &parent.id).await?;

        if let Some(title) = request.title {
            chore.title = title;
        }
        if let Some(description) = request.description {
            chore.description = description;
        }
        if let Some(points) = request.points {
            if points < 0 {
                return Err(DomainError::InvalidAmount(
                    "chore points must not be negative".into(),
                ));
            }
            chore.points = points;
        }
        chore.updated_at = Utc::now().to_rfc3339();

        self.chore_repository
            .update_chore_details(&chore)
            .await
            .map_err(DomainError::storage)?;
        Ok(chore)
    }

    /// Add kids to the chore's assignment set. Kids already assigned
    /// are left alone.
    pub async fn assign_kids(
        &self,
        chore_id: &str,
        request: AssignKidsRequest,
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let mut chore = self.owned_chore(chore_id, &parent.id).await?;

        let verified = self.verify_owned_kids(&parent.id, &request.kid_ids).await?;
        for kid_id in verified {
            if !chore.assigned_kid_ids.contains(&kid_id) {
                chore.assigned_kid_ids.push(kid_id);
            }
        }
        chore.updated_at = Utc::now().to_rfc3339();

        self.chore_repository
            .set_assigned_kids(&chore.id, &chore.assigned_kid_ids, &chore.updated_at)
            .await
            .map_err(DomainError::storage)?;
        Ok(chore)
    }

    pub async fn unassign_kid(
        &self,
        chore_id: &str,
        kid_id: &str,
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let mut chore = self.owned_chore(chore_id, &parent.id).await?;

        chore.assigned_kid_ids.retain(|id| id != kid_id);
        chore.updated_at = Utc::now().to_rfc3339();

        self.chore_repository
            .set_assigned_kids(&chore.id, &chore.assigned_kid_ids, &chore.updated_at)
            .await
            .map_err(DomainError::storage)?;
        Ok(chore)
    }

    /// Move the chore through its lifecycle. On approval of a chore
    /// worth points, every assigned kid is granted one claimable entry;
    /// the compare-and-swap on the stored status guarantees a single
    /// grant even under concurrent approvals.
    pub async fn change_status(
        &self,
        chore_id: &str,
        request: ChangeChoreStatusRequest,
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let actor = self.policy.resolve(user_id).await?;
        let chore = self.chore_for_actor(chore_id, &actor).await?;

        validate_transition(actor.role(), chore.status, request.status)?;

        let previous = chore.status;
        let now = Utc::now().to_rfc3339();
        let mut updated = chore;
        updated.status = request.status;
        // Only the first start is recorded; redo cycles keep it.
        if request.status == ChoreStatus::Started && updated.date_started.is_none() {
            updated.date_started = Some(now.clone());
        }
        if let Some(photo) = request.photo {
            updated.photo = Some(photo);
        }
        updated.updated_at = now;

        let won = self
            .chore_repository
            .transition_chore(&updated, previous)
            .await
            .map_err(DomainError::storage)?;
        if !won {
            return Err(DomainError::InvalidTransition(
                "the chore status changed while this request was in flight".into(),
            ));
        }

        info!(
            "Chore {} moved {} -> {}",
            updated.id,
            previous.as_str(),
            updated.status.as_str()
        );

        if updated.status == ChoreStatus::Approved && updated.points > 0 {
            for kid_id in &updated.assigned_kid_ids {
                self.point_awarder
                    .award_points(
                        kid_id,
                        updated.points,
                        &updated.id,
                        &format!("Completed: {}", updated.title),
                    )
                    .await?;
            }
        }

        Ok(updated)
    }

    /// Kid uploads proof for a chore they are assigned to. The previous
    /// photo, if any, is released best-effort; a failed release never
    /// blocks the new reference.
    pub async fn upload_photo(
        &self,
        chore_id: &str,
        data: &[u8],
        user_id: &str,
    ) -> Result<Chore, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;
        let mut chore = self.assigned_chore(chore_id, &kid.id).await?;

        if let Some(old) = &chore.photo {
            if let Err(err) = self.photo_store.delete_photo(old).await {
                warn!("Failed to release previous photo {}: {}", old, err);
            }
        }

        let reference = self
            .photo_store
            .store_photo(&chore.id, data)
            .await
            .map_err(DomainError::storage)?;

        chore.photo = Some(reference);
        chore.updated_at = Utc::now().to_rfc3339();

        self.chore_repository
            .update_chore_details(&chore)
            .await
            .map_err(DomainError::storage)?;
        Ok(chore)
    }

    pub async fn delete_chore(&self, chore_id: &str, user_id: &str) -> Result<(), DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let chore = self.owned_chore(chore_id, &parent.id).await?;

        self.chore_repository
            .delete_chore(&chore.id)
            .await
            .map_err(DomainError::storage)?;

        info!("Deleted chore {}", chore.id);
        Ok(())
    }

    async fn chore_for_actor(&self, chore_id: &str, actor: &Actor) -> Result<Chore, DomainError> {
        match actor {
            Actor::Parent(user) => self.owned_chore(chore_id, &user.id).await,
            Actor::Child { kid, .. } => self.assigned_chore(chore_id, &kid.id).await,
        }
    }

    async fn owned_chore(&self, chore_id: &str, parent_id: &str) -> Result<Chore, DomainError> {
        let chore = self
            .chore_repository
            .get_chore(chore_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("chore not found".into()))?;
        if chore.parent_id != parent_id {
            return Err(DomainError::Forbidden("you do not own this chore".into()));
        }
        Ok(chore)
    }

    async fn assigned_chore(&self, chore_id: &str, kid_id: &str) -> Result<Chore, DomainError> {
        let chore = self
            .chore_repository
            .get_chore(chore_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("chore not found".into()))?;
        if !chore.assigned_kid_ids.iter().any(|id| id == kid_id) {
            return Err(DomainError::Forbidden(
                "this chore is not assigned to you".into(),
            ));
        }
        Ok(chore)
    }

    /// Check every kid id exists and belongs to the parent, returning
    /// the deduplicated set.
    async fn verify_owned_kids(
        &self,
        parent_id: &str,
        kid_ids: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let mut verified = Vec::new();
        for kid_id in kid_ids {
            let kid = self
                .kid_repository
                .get_kid(kid_id)
                .await
                .map_err(DomainError::storage)?;
            match kid {
                Some(kid) if kid.parent_id == parent_id => {
                    if !verified.contains(&kid.id) {
                        verified.push(kid.id);
                    }
                }
                _ => {
                    return Err(DomainError::NotFound(
                        "one or more kids not found or do not belong to you".into(),
                    ))
                }
            }
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{
        seed_chore, seed_kid, seed_parent, setup, setup_with_photo_dir,
    };
    use shared::PointStatus;

    /// The complete rule table: every (role, current, target) triple
    /// outside it must fail, and the failure kind depends on whether
    /// the role may ever set the target status.
    #[test]
    fn test_transition_rule_table() {
        use ChoreStatus::*;
        let statuses = [Created, Started, Finished, Approved, Redo, Rejected];
        let accepted = |role: Role, current: ChoreStatus, target: ChoreStatus| match (role, target) {
            (Role::Parent, Approved) | (Role::Parent, Redo) | (Role::Parent, Rejected) => {
                current == Finished
            }
            (Role::Child, Started) => matches!(current, Created | Redo),
            (Role::Child, Finished) => current == Started,
            _ => false,
        };
        let role_may_target = |role: Role, target: ChoreStatus| match role {
            Role::Parent => matches!(target, Approved | Redo | Rejected),
            Role::Child => matches!(target, Started | Finished),
        };

        for role in [Role::Parent, Role::Child] {
            for current in statuses {
                for target in statuses {
                    let result = validate_transition(role, current, target);
                    if accepted(role, current, target) {
                        assert!(
                            result.is_ok(),
                            "{:?}: {current:?} -> {target:?} should be accepted",
                            role
                        );
                    } else if role_may_target(role, target) {
                        assert!(
                            matches!(result, Err(DomainError::InvalidTransition(_))),
                            "{:?}: {current:?} -> {target:?} should be an invalid transition",
                            role
                        );
                    } else {
                        assert!(
                            matches!(result, Err(DomainError::Forbidden(_))),
                            "{:?}: {current:?} -> {target:?} should be forbidden",
                            role
                        );
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_create_chore_with_initial_assignment() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let robin = seed_kid(&env, &parent, "Robin").await;
        let sam = seed_kid(&env, &parent, "Sam").await;

        let chore = env
            .chore_service
            .create_chore(
                CreateChoreRequest {
                    title: "Dishes".into(),
                    description: "After dinner".into(),
                    points: Some(5),
                    kid_ids: Some(vec![robin.id.clone(), sam.id.clone(), robin.id.clone()]),
                },
                &parent.id,
            )
            .await
            .unwrap();

        assert_eq!(chore.status, ChoreStatus::Created);
        assert_eq!(chore.points, 5);
        assert_eq!(chore.assigned_kid_ids.len(), 2);
        assert!(chore.date_started.is_none());
    }

    #[tokio::test]
    async fn test_create_chore_validations() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let foreign_kid = seed_kid(&env, &other, "Alex").await;

        let err = env
            .chore_service
            .create_chore(
                CreateChoreRequest {
                    title: "Dishes".into(),
                    description: String::new(),
                    points: Some(-1),
                    kid_ids: None,
                },
                &parent.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));

        let err = env
            .chore_service
            .create_chore(
                CreateChoreRequest {
                    title: "Dishes".into(),
                    description: String::new(),
                    points: None,
                    kid_ids: Some(vec![foreign_kid.id]),
                },
                &parent.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_date_started_records_first_start_only() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        let started = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap();
        let first_start = started.date_started.clone().unwrap();

        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Finished, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap();
        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Redo, photo: None },
                &parent.id,
            )
            .await
            .unwrap();

        let restarted = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap();
        assert_eq!(restarted.date_started.as_deref(), Some(first_start.as_str()));
    }

    #[tokio::test]
    async fn test_photo_supplied_with_transition_overwrites() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 0).await;

        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap();
        let finished = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest {
                    status: ChoreStatus::Finished,
                    photo: Some("proof-1".into()),
                },
                &kid.user_id,
            )
            .await
            .unwrap();
        assert_eq!(finished.photo.as_deref(), Some("proof-1"));

        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Redo, photo: None },
                &parent.id,
            )
            .await
            .unwrap();
        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap();
        let refinished = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest {
                    status: ChoreStatus::Finished,
                    photo: Some("proof-2".into()),
                },
                &kid.user_id,
            )
            .await
            .unwrap();
        assert_eq!(refinished.photo.as_deref(), Some("proof-2"));
    }

    #[tokio::test]
    async fn test_approval_grants_one_entry_per_assigned_kid() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let robin = seed_kid(&env, &parent, "Robin").await;
        let sam = seed_kid(&env, &parent, "Sam").await;
        let chore = seed_chore(&env, &parent, &[&robin, &sam], 5).await;

        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &robin.user_id,
            )
            .await
            .unwrap();
        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Finished, photo: None },
                &robin.user_id,
            )
            .await
            .unwrap();
        env.chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Approved, photo: None },
                &parent.id,
            )
            .await
            .unwrap();

        for kid in [&robin, &sam] {
            let available = env
                .points_service
                .available_points(&kid.user_id)
                .await
                .unwrap();
            assert_eq!(available.entries.len(), 1);
            assert_eq!(available.total, 5);
            let entry = &available.entries[0];
            assert_eq!(entry.status, PointStatus::Claimable);
            assert_eq!(entry.chore_id.as_deref(), Some(chore.id.as_str()));
            assert_eq!(entry.description, format!("Completed: {}", chore.title));
        }
    }

    #[tokio::test]
    async fn test_approval_of_zero_point_chore_grants_nothing() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 0).await;

        for (status, caller) in [
            (ChoreStatus::Started, kid.user_id.as_str()),
            (ChoreStatus::Finished, kid.user_id.as_str()),
            (ChoreStatus::Approved, parent.id.as_str()),
        ] {
            env.chore_service
                .change_status(
                    &chore.id,
                    ChangeChoreStatusRequest { status, photo: None },
                    caller,
                )
                .await
                .unwrap();
        }

        let available = env.points_service.available_points(&kid.user_id).await.unwrap();
        assert!(available.entries.is_empty());
        assert_eq!(available.total, 0);
    }

    #[tokio::test]
    async fn test_child_attempting_parent_action_is_forbidden() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        // Role check fires before the transition table: a child moving
        // a created chore to approved gets Forbidden, not
        // InvalidTransition.
        let err = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Approved, photo: None },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_parent_cannot_settle_unfinished_chore() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        let err = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Approved, photo: None },
                &parent.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        // The failed attempt leaves the record unchanged.
        let reloaded = env.chore_service.get_chore(&chore.id, &parent.id).await.unwrap();
        assert_eq!(reloaded.status, ChoreStatus::Created);
    }

    #[tokio::test]
    async fn test_approved_and_rejected_are_terminal() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        for settle in [ChoreStatus::Approved, ChoreStatus::Rejected] {
            let chore = seed_chore(&env, &parent, &[&kid], 0).await;
            for (status, caller) in [
                (ChoreStatus::Started, kid.user_id.as_str()),
                (ChoreStatus::Finished, kid.user_id.as_str()),
                (settle, parent.id.as_str()),
            ] {
                env.chore_service
                    .change_status(
                        &chore.id,
                        ChangeChoreStatusRequest { status, photo: None },
                        caller,
                    )
                    .await
                    .unwrap();
            }

            // Neither the kid nor the parent can move it again.
            let err = env
                .chore_service
                .change_status(
                    &chore.id,
                    ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                    &kid.user_id,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition(_)));

            let err = env
                .chore_service
                .change_status(
                    &chore.id,
                    ChangeChoreStatusRequest { status: ChoreStatus::Redo, photo: None },
                    &parent.id,
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidTransition(_)));
        }
    }

    #[tokio::test]
    async fn test_cross_parent_access_is_forbidden() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        let err = env.chore_service.get_chore(&chore.id, &other.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = env
            .chore_service
            .delete_chore(&chore.id, &other.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unassigned_kid_cannot_touch_chore() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let robin = seed_kid(&env, &parent, "Robin").await;
        let sam = seed_kid(&env, &parent, "Sam").await;
        let chore = seed_chore(&env, &parent, &[&robin], 5).await;

        let err = env
            .chore_service
            .change_status(
                &chore.id,
                ChangeChoreStatusRequest { status: ChoreStatus::Started, photo: None },
                &sam.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_assign_and_unassign_kids() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let robin = seed_kid(&env, &parent, "Robin").await;
        let sam = seed_kid(&env, &parent, "Sam").await;
        let chore = seed_chore(&env, &parent, &[&robin], 5).await;

        let chore = env
            .chore_service
            .assign_kids(
                &chore.id,
                AssignKidsRequest { kid_ids: vec![robin.id.clone(), sam.id.clone()] },
                &parent.id,
            )
            .await
            .unwrap();
        assert_eq!(chore.assigned_kid_ids.len(), 2);

        let chore = env
            .chore_service
            .unassign_kid(&chore.id, &robin.id, &parent.id)
            .await
            .unwrap();
        assert_eq!(chore.assigned_kid_ids, vec![sam.id.clone()]);
    }

    #[tokio::test]
    async fn test_update_chore_edits_fields_only() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        let updated = env
            .chore_service
            .update_chore(
                &chore.id,
                UpdateChoreRequest {
                    title: Some("Dishes and counters".into()),
                    description: None,
                    points: Some(8),
                },
                &parent.id,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dishes and counters");
        assert_eq!(updated.points, 8);
        assert_eq!(updated.status, chore.status);
        assert_eq!(updated.parent_id, chore.parent_id);

        let err = env
            .chore_service
            .update_chore(
                &chore.id,
                UpdateChoreRequest { title: None, description: None, points: Some(-2) },
                &parent.id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[tokio::test]
    async fn test_upload_photo_replaces_previous_reference() {
        let env = setup_with_photo_dir().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        let first = env
            .chore_service
            .upload_photo(&chore.id, b"first", &kid.user_id)
            .await
            .unwrap();
        let first_ref = first.photo.clone().unwrap();

        let second = env
            .chore_service
            .upload_photo(&chore.id, b"second", &kid.user_id)
            .await
            .unwrap();
        let second_ref = second.photo.clone().unwrap();

        assert_ne!(first_ref, second_ref);

        // Parents do not upload proof.
        let err = env
            .chore_service
            .upload_photo(&chore.id, b"third", &parent.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_delete_chore() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;
        let chore = seed_chore(&env, &parent, &[&kid], 5).await;

        env.chore_service.delete_chore(&chore.id, &parent.id).await.unwrap();

        let err = env.chore_service.get_chore(&chore.id, &parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_chores_scoped_by_role() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let robin = seed_kid(&env, &parent, "Robin").await;
        let sam = seed_kid(&env, &parent, "Sam").await;
        seed_chore(&env, &parent, &[&robin], 5).await;
        seed_chore(&env, &parent, &[&robin, &sam], 3).await;
        seed_chore(&env, &parent, &[], 1).await;

        let all = env.chore_service.list_chores(&parent.id).await.unwrap();
        assert_eq!(all.chores.len(), 3);

        let robins = env.chore_service.list_chores(&robin.user_id).await.unwrap();
        assert_eq!(robins.chores.len(), 2);

        let sams = env.chore_service.list_chores(&sam.user_id).await.unwrap();
        assert_eq!(sams.chores.len(), 1);
    }
}
