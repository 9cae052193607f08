//! User Service Implementation
//!
//! Credential store operations: account creation with hashed passwords,
//! lookups, profile updates and admin account management.

use std::sync::Arc;

use log::info;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateUserRequest, Role, UpdateDetailsRequest, UpdateUserRequest, User, UserCredentials,
};
use crate::service::RatingAggregator;
use crate::store::{NewUser, Store, UserChanges};
use crate::utils::{
    error::{AppError, AppResult},
    security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST},
    validation::normalize_email,
};

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User not found with id of {}", id))
}

/// Core user service providing CRUD operations over accounts
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,

    /// bcrypt cost factor for password hashing (higher = more secure but slower)
    bcrypt_cost: u32,

    ratings: RatingAggregator,
}

impl UserService {
    /// Creates a new UserService with the default bcrypt cost
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_bcrypt_cost(store, DEFAULT_BCRYPT_COST)
    }

    /// Creates a new UserService with a custom bcrypt cost
    pub fn with_bcrypt_cost(store: Arc<dyn Store>, bcrypt_cost: u32) -> Self {
        Self {
            ratings: RatingAggregator::new(store.clone()),
            store,
            bcrypt_cost,
        }
    }

    /// Creates a new account; the email must not be registered yet
    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        request.validate()?;

        let password_hash = self.hash(&request.password)?;
        let user = self
            .store
            .insert_user(NewUser {
                name: request.name.trim().to_string(),
                email: normalize_email(&request.email),
                role: request.role.unwrap_or_default(),
                password_hash,
            })
            .await?;

        info!("Created {} account {}", user.role, user.id);
        Ok(user)
    }

    /// Retrieves a user by their unique ID
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Lists every account (admin)
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    /// Secret-bearing lookup by email, normalized before matching
    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<UserCredentials>> {
        Ok(self
            .store
            .find_credentials_by_email(&normalize_email(email))
            .await?)
    }

    /// Secret-bearing lookup by id
    pub async fn get_credentials(&self, user_id: Uuid) -> AppResult<UserCredentials> {
        self.store
            .find_credentials(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Checks a candidate password against the stored hash
    pub fn verify_password(
        &self,
        credentials: &UserCredentials,
        candidate: &str,
    ) -> AppResult<bool> {
        Ok(verify_password(candidate, &credentials.password_hash)?)
    }

    /// Hash a password with the configured cost
    pub fn hash(&self, password: &str) -> AppResult<String> {
        Ok(hash_password_with_cost(password, self.bcrypt_cost)?)
    }

    /// Replace the user's password
    pub async fn set_password(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let password_hash = self.hash(password)?;
        if !self.store.set_password_hash(user_id, &password_hash).await? {
            return Err(user_not_found(user_id));
        }
        Ok(())
    }

    /// Updates the caller's own name and email
    pub async fn update_details(
        &self,
        user_id: Uuid,
        request: UpdateDetailsRequest,
    ) -> AppResult<User> {
        request.validate()?;

        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            role: None,
        };

        self.store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Admin update, including role changes
    pub async fn update_user(&self, user_id: Uuid, request: UpdateUserRequest) -> AppResult<User> {
        request.validate()?;

        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            role: request.role,
        };

        self.store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Deletes an account together with its reviews and offerings
    ///
    /// Accounts that still own a restaurant are rejected by the store; the
    /// restaurant has to be deleted or reassigned first. Ratings of every
    /// restaurant that lost a review are recomputed.
    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        let affected = self
            .store
            .delete_user(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        for restaurant_id in affected {
            self.ratings.recompute(restaurant_id).await;
        }

        info!("Deleted account {}", user_id);
        Ok(())
    }

    /// Whether the role may be chosen at self-registration
    pub fn is_self_assignable(role: Role) -> bool {
        !role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn create_test_service() -> UserService {
        UserService::with_bcrypt_cost(Arc::new(MemoryStore::new()), 4)
    }

    fn create_test_user_request() -> CreateUserRequest {
        CreateUserRequest {
            name: "John Doe".to_string(),
            email: "John.Doe@Example.com".to_string(),
            password: "secret1".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_normalizes_and_hashes() {
        let service = create_test_service();
        let user = service.create_user(create_test_user_request()).await.unwrap();

        assert_eq!(user.email, "john.doe@example.com");
        assert_eq!(user.role, Role::User);

        let credentials = service.get_credentials(user.id).await.unwrap();
        assert_ne!(credentials.password_hash, "secret1");
        assert!(service.verify_password(&credentials, "secret1").unwrap());
        assert!(!service.verify_password(&credentials, "secret2").unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let service = create_test_service();
        service.create_user(create_test_user_request()).await.unwrap();

        let result = service.create_user(create_test_user_request()).await;
        assert!(matches!(result, Err(AppError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected() {
        let service = create_test_service();
        let request = CreateUserRequest {
            password: "nodigits".to_string(),
            ..create_test_user_request()
        };

        assert!(matches!(
            service.create_user(request).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_details_collision() {
        let service = create_test_service();
        service.create_user(create_test_user_request()).await.unwrap();
        let other = service
            .create_user(CreateUserRequest {
                email: "other@example.com".to_string(),
                ..create_test_user_request()
            })
            .await
            .unwrap();

        let result = service
            .update_details(
                other.id,
                UpdateDetailsRequest {
                    name: None,
                    email: Some("john.doe@example.com".to_string()),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let service = create_test_service();
        assert!(matches!(
            service.get_user(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_admin_not_self_assignable() {
        assert!(UserService::is_self_assignable(Role::User));
        assert!(UserService::is_self_assignable(Role::Owner));
        assert!(!UserService::is_self_assignable(Role::Admin));
    }
}
