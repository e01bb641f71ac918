//! Kid profile management.
//!
//! Creating a kid also provisions the linked child login account with a
//! plus-addressed email derived from the parent's address; the
//! credential itself is issued by the identity provider, not here.

use std::sync::Arc;

use chrono::Utc;
use shared::{CreateKidRequest, CreateKidResponse, Kid, KidListResponse, Role, UpdateKidRequest, User};
use tracing::info;

use crate::domain::access_policy::AccessPolicy;
use crate::domain::errors::DomainError;
use crate::storage::{Connection, KidStore, UserStore};

#[derive(Clone)]
pub struct KidService<C: Connection> {
    kid_repository: C::KidRepository,
    user_repository: C::UserRepository,
    policy: AccessPolicy<C>,
}

impl<C: Connection> KidService<C> {
    pub fn new(connection: Arc<C>, policy: AccessPolicy<C>) -> Self {
        Self {
            kid_repository: connection.create_kid_repository(),
            user_repository: connection.create_user_repository(),
            policy,
        }
    }

    /// Parent creates a kid profile plus its linked login account.
    pub async fn create_kid(
        &self,
        request: CreateKidRequest,
        user_id: &str,
    ) -> Result<CreateKidResponse, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;

        let login_email = self.next_kid_email(&parent).await?;
        let now = Utc::now().to_rfc3339();

        let name = request.name.trim().to_string();
        let mut words = name.split_whitespace();
        let first_name = words.next().unwrap_or(&name).to_string();
        let last_name = words.collect::<Vec<_>>().join(" ");

        let account = User {
            id: User::generate_id(),
            email: login_email.clone(),
            role: Role::Child,
            first_name,
            last_name,
            active: true,
            created_at: now.clone(),
        };
        self.user_repository
            .store_user(&account)
            .await
            .map_err(DomainError::storage)?;

        let kid = Kid {
            id: Kid::generate_id(),
            name,
            date_of_birth: request.date_of_birth,
            notes: request.notes,
            active: true,
            parent_id: parent.id,
            user_id: account.id,
            created_at: now.clone(),
            updated_at: now,
        };
        self.kid_repository
            .store_kid(&kid)
            .await
            .map_err(DomainError::storage)?;

        info!("Created kid {} with account {}", kid.id, login_email);
        Ok(CreateKidResponse { kid, login_email })
    }

    pub async fn list_kids(&self, user_id: &str) -> Result<KidListResponse, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let kids = self
            .kid_repository
            .list_kids(&parent.id)
            .await
            .map_err(DomainError::storage)?;
        Ok(KidListResponse { kids })
    }

    pub async fn get_kid(&self, kid_id: &str, user_id: &str) -> Result<Kid, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        self.owned_kid(kid_id, &parent.id).await
    }

    /// Parent edits profile fields. Identity, owner and the linked
    /// account are never touched.
    pub async fn update_kid(
        &self,
        kid_id: &str,
        request: UpdateKidRequest,
        user_id: &str,
    ) -> Result<Kid, DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let mut kid = self.owned_kid(kid_id, &parent.id).await?;

        if let Some(name) = request.name {
            kid.name = name.trim().to_string();
        }
        if let Some(date_of_birth) = request.date_of_birth {
            kid.date_of_birth = Some(date_of_birth);
        }
        if let Some(notes) = request.notes {
            kid.notes = Some(notes);
        }
        if let Some(active) = request.active {
            kid.active = active;
        }
        kid.updated_at = Utc::now().to_rfc3339();

        self.kid_repository
            .update_kid(&kid)
            .await
            .map_err(DomainError::storage)?;
        Ok(kid)
    }

    /// Parent deletes a kid along with the linked login account.
    pub async fn delete_kid(&self, kid_id: &str, user_id: &str) -> Result<(), DomainError> {
        let parent = self.policy.require_parent(user_id).await?;
        let kid = self.owned_kid(kid_id, &parent.id).await?;

        self.kid_repository
            .delete_kid(&kid.id)
            .await
            .map_err(DomainError::storage)?;
        self.user_repository
            .delete_user(&kid.user_id)
            .await
            .map_err(DomainError::storage)?;

        info!("Deleted kid {} and account {}", kid.id, kid.user_id);
        Ok(())
    }

    /// The calling kid's own profile.
    pub async fn my_profile(&self, user_id: &str) -> Result<Kid, DomainError> {
        let (_, kid) = self.policy.require_child(user_id).await?;
        Ok(kid)
    }

    async fn owned_kid(&self, kid_id: &str, parent_id: &str) -> Result<Kid, DomainError> {
        let kid = self
            .kid_repository
            .get_kid(kid_id)
            .await
            .map_err(DomainError::storage)?
            .ok_or_else(|| DomainError::NotFound("kid not found".into()))?;
        if kid.parent_id != parent_id {
            return Err(DomainError::Forbidden("this kid does not belong to you".into()));
        }
        Ok(kid)
    }

    /// Generate the next free plus-addressed login email under the
    /// parent's address, e.g. `dana+2@example.com` for the second kid.
    async fn next_kid_email(&self, parent: &User) -> Result<String, DomainError> {
        let (local, domain) = parent
            .email
            .split_once('@')
            .unwrap_or((parent.email.as_str(), "family.invalid"));

        let count = self
            .kid_repository
            .count_kids(&parent.id)
            .await
            .map_err(DomainError::storage)?;
        let mut n = count + 1;
        loop {
            let candidate = format!("{local}+{n}@{domain}");
            let taken = self
                .user_repository
                .get_user_by_email(&candidate)
                .await
                .map_err(DomainError::storage)?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::{seed_kid, seed_parent, setup};

    #[tokio::test]
    async fn test_create_kid_provisions_linked_account() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;

        let first = env
            .kid_service
            .create_kid(
                CreateKidRequest {
                    name: "Robin Q Example".into(),
                    date_of_birth: Some("2015-06-15".into()),
                    notes: None,
                },
                &parent.id,
            )
            .await
            .unwrap();
        assert_eq!(first.login_email, "dana+1@example.com");
        assert_eq!(first.kid.parent_id, parent.id);

        let account = env.policy.resolve(&first.kid.user_id).await.unwrap();
        assert_eq!(account.role(), Role::Child);
        assert_eq!(account.user().email, "dana+1@example.com");
        assert_eq!(account.user().first_name, "Robin");
        assert_eq!(account.user().last_name, "Q Example");

        let second = env
            .kid_service
            .create_kid(
                CreateKidRequest {
                    name: "Sam".into(),
                    date_of_birth: None,
                    notes: None,
                },
                &parent.id,
            )
            .await
            .unwrap();
        assert_eq!(second.login_email, "dana+2@example.com");
    }

    #[tokio::test]
    async fn test_create_kid_requires_parent() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        let err = env
            .kid_service
            .create_kid(
                CreateKidRequest {
                    name: "Nested".into(),
                    date_of_birth: None,
                    notes: None,
                },
                &kid.user_id,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_kid_edits_profile_fields_only() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        let updated = env
            .kid_service
            .update_kid(
                &kid.id,
                UpdateKidRequest {
                    name: Some("Robin Jr".into()),
                    date_of_birth: None,
                    notes: Some("allergic to mowing".into()),
                    active: Some(false),
                },
                &parent.id,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Robin Jr");
        assert_eq!(updated.notes.as_deref(), Some("allergic to mowing"));
        assert!(!updated.active);
        assert_eq!(updated.parent_id, kid.parent_id);
        assert_eq!(updated.user_id, kid.user_id);
    }

    #[tokio::test]
    async fn test_delete_kid_removes_linked_account() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        env.kid_service.delete_kid(&kid.id, &parent.id).await.unwrap();

        let err = env.kid_service.get_kid(&kid.id, &parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = env.policy.resolve(&kid.user_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_kid_ownership_checks() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let other = seed_parent(&env, "casey@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        let err = env.kid_service.get_kid(&kid.id, &other.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = env
            .kid_service
            .get_kid("kid::missing", &parent.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_my_profile() {
        let env = setup().await;
        let parent = seed_parent(&env, "dana@example.com").await;
        let kid = seed_kid(&env, &parent, "Robin").await;

        let profile = env.kid_service.my_profile(&kid.user_id).await.unwrap();
        assert_eq!(profile.id, kid.id);

        let err = env.kid_service.my_profile(&parent.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
