//! Caller resolution and role predicates.
//!
//! Every core operation starts here: a caller id resolves to an
//! [`Actor`], and ownership checks hang off the resolved role. Role
//! checks always run before any state machine or ledger rule.

use std::sync::Arc;

use shared::{Kid, Role, User};

use crate::domain::errors::DomainError;
use crate::storage::{Connection, KidStore, UserStore};

/// A resolved caller. Children always carry their kid profile so
/// ownership checks never need a second lookup.
#[derive(Debug, Clone)]
pub enum Actor {
    Parent(User),
    Child { user: User, kid: Kid },
}

impl Actor {
    pub fn role(&self) -> Role {
        match self {
            Actor::Parent(_) => Role::Parent,
            Actor::Child { .. } => Role::Child,
        }
    }

    pub fn user(&self) -> &User {
        match self {
            Actor::Parent(user) => user,
            Actor::Child { user, .. } => user,
        }
    }
}

#[derive(Clone)]
pub struct AccessPolicy<C: Connection> {
    user_repository: C::UserRepository,
    kid_repository: C::KidRepository,
}

impl<C: Connection> AccessPolicy<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            user_repository: connection.create_user_repository(),
            kid_repository: connection.create_kid_repository(),
        }
    }

    /// Resolve a caller id to an actor. Unknown ids are `NotFound`,
    /// deactivated accounts are `Forbidden`, and a child account
    /// without a kid profile is `NotFound`.
    pub async fn resolve(&self, user_id: &str) -> Result<Actor, DomainError> {
        let user = self
            .user_repository
            .get_user(user_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("user not found".into()))?;

        if !user.active {
            return Err(DomainError::Forbidden("this account is deactivated".into()));
        }

        match user.role {
            Role::Parent => Ok(Actor::Parent(user)),
            Role::Child => {
                let kid = self
                    .kid_repository
                    .get_kid_by_user(&user.id)
                    .await
                    .map_err(DomainError::storage)?
                    .ok_or_else(|| DomainError::NotFound("kid profile not found".into()))?;
                Ok(Actor::Child { user, kid })
            }
        }
    }

    pub async fn require_parent(&self, user_id: &str) -> Result<User, DomainError> {
        match self.resolve(user_id).await? {
            Actor::Parent(user) => Ok(user),
            Actor::Child { .. } => Err(DomainError::Forbidden(
                "only parents can perform this action".into(),
            )),
        }
    }

    pub async fn require_child(&self, user_id: &str) -> Result<(User, Kid), DomainError> {
        match self.resolve(user_id).await? {
            Actor::Child { user, kid } => Ok((user, kid)),
            Actor::Parent(_) => Err(DomainError::Forbidden(
                "only kids can perform this action".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{seed_parent, setup};
    use shared::CreateKidRequest;

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let env = setup().await;
        let err = env.policy.resolve("user::missing").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deactivated_account_is_forbidden() {
        let env = setup().await;
        let mut parent = seed_parent(&env, "dana@example.com").await;
        parent.active = false;
        // Re-seed with the inactive flag set.
        let users = env.connection.create_user_repository();
        users.delete_user(&parent.id).await.unwrap();
        users.store_user(&parent).await.unwrap();

        let err = env.policy.resolve(&parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_role_mismatch_is_forbidden() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = env
            .kid_service
            .create_kid(
                CreateKidRequest {
                    name: "Robin".into(),
                    date_of_birth: None,
                    notes: None,
                },
                &parent.id,
            )
            .await
            .unwrap()
            .kid;

        let err = env.policy.require_parent(&kid.user_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = env.policy.require_child(&parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_child_resolution_carries_kid_profile() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = env
            .kid_service
            .create_kid(
                CreateKidRequest {
                    name: "Robin".into(),
                    date_of_birth: None,
                    notes: None,
                },
                &parent.id,
            )
            .await
            .unwrap()
            .kid;

        let (user, resolved) = env.policy.require_child(&kid.user_id).await.unwrap();
        assert_eq!(user.id, kid.user_id);
        assert_eq!(resolved.id, kid.id);
        assert_eq!(resolved.parent_id, parent.id);
    }
}
