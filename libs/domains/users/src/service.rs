use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, ListUsersQuery, UpdateUser, User, UserFilter, UserResponse};
use crate::repository::UserRepository;

/// Service layer for user business logic
///
/// Owns validation, uniqueness pre-checks and password hashing. Storage goes
/// through the injected [`UserRepository`], so the same service runs against
/// Postgres in production and the in-memory store in tests.
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user with validation and password hashing
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let email = input.email.to_lowercase();

        // Email is checked before phone, so on a doubly-conflicting payload
        // the email violation is the one reported
        if self.repository.exists_by_email(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        if let Some(ref phone) = input.phone {
            if self.repository.exists_by_phone(phone).await? {
                return Err(UserError::DuplicatePhone(phone.clone()));
            }
        }

        let password_hash = self.hash_password(&input.password)?;

        let user = User::new(
            email,
            input.first_name,
            input.last_name,
            input.phone,
            input.role,
            password_hash,
        );

        let created = self.repository.create(user).await?;
        Ok(created.into())
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        Ok(user.into())
    }

    /// Get a user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> UserResult<UserResponse> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| UserError::EmailNotFound(email.to_string()))?;

        Ok(user.into())
    }

    /// List users, newest first, with the filtered total
    ///
    /// `page` is 1-based; the offset saturates so page 0 reads like page 1.
    pub async fn list_users(&self, query: ListUsersQuery) -> UserResult<(Vec<UserResponse>, u64)> {
        let filter = UserFilter {
            is_active: query.is_active,
            limit: query.page_size,
            offset: query.page.saturating_sub(1) * query.page_size,
        };

        let (users, total) = self.repository.list(filter).await?;
        Ok((users.into_iter().map(Into::into).collect(), total))
    }

    /// Apply a partial update to a user
    ///
    /// Uniqueness is re-checked only for values that actually change; an
    /// empty patch returns the stored entity untouched, `updated_at` included.
    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if input.is_empty() {
            return Ok(user.into());
        }

        if let Some(ref new_email) = input.email {
            let normalized = new_email.to_lowercase();
            if normalized != user.email.to_lowercase()
                && self.repository.exists_by_email(&normalized).await?
            {
                return Err(UserError::DuplicateEmail(normalized));
            }
        }

        if let Some(ref new_phone) = input.phone {
            if user.phone.as_deref() != Some(new_phone.as_str())
                && self.repository.exists_by_phone(new_phone).await?
            {
                return Err(UserError::DuplicatePhone(new_phone.clone()));
            }
        }

        user.apply_update(input);

        let updated = self.repository.update(user).await?;
        Ok(updated.into())
    }

    /// Change a user's password
    ///
    /// The stored hash stays untouched unless the current password verifies.
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<UserResponse> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        if !self.verify_password(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        user.password_hash = self.hash_password(new_password)?;
        user.updated_at = chrono::Utc::now();

        let updated = self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Password changed");
        Ok(updated.into())
    }

    /// Hard-delete a user
    pub async fn delete_user(&self, id: Uuid) -> UserResult<()> {
        let deleted = self.repository.delete(id).await?;
        if !deleted {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    /// Verify login credentials and return the account
    ///
    /// Unknown email and wrong password both come back as the opaque
    /// `InvalidCredentials`; deactivation is only revealed after the
    /// password verifies.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> UserResult<UserResponse> {
        let user = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(UserError::AccountDeactivated);
        }

        Ok(user.into())
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::repository::MockUserRepository;
    use mockall::predicate;

    fn hash_for(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn sample_user(email: &str, password_hash: &str) -> User {
        User::new(
            email.to_string(),
            "Alice".to_string(),
            "Smith".to_string(),
            None,
            UserRole::Student,
            password_hash.to_string(),
        )
    }

    fn create_input(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            phone: None,
            role: UserRole::Student,
            password: "correct-horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_lowercases_email_and_hashes_password() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_exists_by_email()
            .with(predicate::eq("alice@example.com"))
            .returning(|_| Ok(false));
        mock_repo
            .expect_create()
            .withf(|user: &User| {
                user.email == "alice@example.com"
                    && user.password_hash.starts_with("$argon2")
                    && user.password_hash != "correct-horse"
            })
            .returning(|user| Ok(user));

        let service = UserService::new(mock_repo);
        let response = service
            .create_user(create_input("Alice@Example.COM"))
            .await
            .unwrap();

        assert_eq!(response.email, "alice@example.com");
        assert_eq!(response.full_name, "Alice Smith");
    }

    #[tokio::test]
    async fn test_create_user_rejects_short_password_before_any_lookup() {
        // No expectations set: any repository call would panic the mock
        let service = UserService::new(MockUserRepository::new());

        let mut input = create_input("alice@example.com");
        input.password = "short".to_string();

        let result = service.create_user(input).await;
        assert!(
            matches!(result, Err(UserError::Validation(_))),
            "Expected validation error, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_exists_by_email().returning(|_| Ok(true));
        mock_repo.expect_create().times(0);

        let service = UserService::new(mock_repo);
        let result = service.create_user(create_input("taken@example.com")).await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_create_user_reports_email_conflict_before_phone() {
        // Both values are taken; the email violation must win and the phone
        // must never be consulted
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_exists_by_email().returning(|_| Ok(true));
        mock_repo.expect_exists_by_phone().times(0);
        mock_repo.expect_create().times(0);

        let service = UserService::new(mock_repo);
        let mut input = create_input("taken@example.com");
        input.phone = Some("+15551234567".to_string());

        let result = service.create_user(input).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_phone() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_exists_by_email().returning(|_| Ok(false));
        mock_repo
            .expect_exists_by_phone()
            .with(predicate::eq("+15551234567"))
            .returning(|_| Ok(true));
        mock_repo.expect_create().times(0);

        let service = UserService::new(mock_repo);
        let mut input = create_input("free@example.com");
        input.phone = Some("+15551234567".to_string());

        let result = service.create_user(input).await;
        assert!(matches!(result, Err(UserError::DuplicatePhone(_))));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = UserService::new(mock_repo);
        let result = service.get_user(Uuid::now_v7()).await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_user_same_email_different_case_skips_uniqueness_check() {
        let user = sample_user("alice@example.com", "hashed");
        let user_id = user.id;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(user_id))
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo.expect_exists_by_email().times(0);
        mock_repo.expect_update().returning(|user| Ok(user));

        let service = UserService::new(mock_repo);
        let response = service
            .update_user(
                user_id,
                UpdateUser {
                    email: Some("ALICE@EXAMPLE.COM".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(response.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_update_user_duplicate_email() {
        let user = sample_user("alice@example.com", "hashed");
        let user_id = user.id;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo
            .expect_exists_by_email()
            .with(predicate::eq("taken@example.com"))
            .returning(|_| Ok(true));
        mock_repo.expect_update().times(0);

        let service = UserService::new(mock_repo);
        let result = service
            .update_user(
                user_id,
                UpdateUser {
                    email: Some("taken@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_update_user_empty_patch_is_noop() {
        let user = sample_user("alice@example.com", "hashed");
        let user_id = user.id;
        let original_updated_at = user.updated_at;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo.expect_update().times(0);

        let service = UserService::new(mock_repo);
        let response = service
            .update_user(user_id, UpdateUser::default())
            .await
            .unwrap();

        assert_eq!(response.updated_at, original_updated_at);
        assert_eq!(response.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_keeps_hash() {
        let user = sample_user("alice@example.com", &hash_for("old-password"));
        let user_id = user.id;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo.expect_update().times(0);

        let service = UserService::new(mock_repo);
        let result = service
            .change_password(user_id, "not-the-password", "brand-new-pass")
            .await;

        assert!(
            matches!(result, Err(UserError::InvalidCredentials)),
            "Expected InvalidCredentials, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_change_password_stores_hash_of_new_password() {
        let user = sample_user("alice@example.com", &hash_for("old-password"));
        let user_id = user.id;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        mock_repo
            .expect_update()
            .withf(|user: &User| {
                let parsed = PasswordHash::new(&user.password_hash).unwrap();
                Argon2::default()
                    .verify_password(b"brand-new-pass", &parsed)
                    .is_ok()
            })
            .returning(|user| Ok(user));

        let service = UserService::new(mock_repo);
        let response = service
            .change_password(user_id, "old-password", "brand-new-pass")
            .await
            .unwrap();

        assert_eq!(response.id, user_id);
    }

    #[tokio::test]
    async fn test_verify_credentials_unknown_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().returning(|_| Ok(None));

        let service = UserService::new(mock_repo);
        let result = service
            .verify_credentials("ghost@example.com", "whatever")
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verify_credentials_wrong_password() {
        let user = sample_user("alice@example.com", &hash_for("right-password"));

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .with(predicate::eq("alice@example.com"))
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(mock_repo);
        let result = service
            .verify_credentials("alice@example.com", "wrong-password")
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verify_credentials_deactivated_account() {
        let mut user = sample_user("alice@example.com", &hash_for("right-password"));
        user.is_active = false;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(mock_repo);
        let result = service
            .verify_credentials("alice@example.com", "right-password")
            .await;

        assert!(
            matches!(result, Err(UserError::AccountDeactivated)),
            "Expected AccountDeactivated, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_verify_credentials_checks_password_before_active_flag() {
        // A wrong password on a deactivated account must not reveal the
        // deactivation
        let mut user = sample_user("alice@example.com", &hash_for("right-password"));
        user.is_active = false;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(mock_repo);
        let result = service
            .verify_credentials("alice@example.com", "wrong-password")
            .await;

        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_verify_credentials_success() {
        let user = sample_user("alice@example.com", &hash_for("right-password"));
        let user_id = user.id;

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(mock_repo);
        let response = service
            .verify_credentials("alice@example.com", "right-password")
            .await
            .unwrap();

        assert_eq!(response.id, user_id);
        assert_eq!(response.full_name, "Alice Smith");
    }

    #[tokio::test]
    async fn test_list_users_maps_page_to_offset() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_list()
            .withf(|filter: &UserFilter| filter.offset == 20 && filter.limit == 10)
            .returning(|_| Ok((vec![], 0)));

        let service = UserService::new(mock_repo);
        let query = ListUsersQuery {
            page: 3,
            page_size: 10,
            is_active: None,
        };

        let (items, total) = service.list_users(query).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_list_users_first_page_is_offset_zero() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_list()
            .withf(|filter: &UserFilter| filter.offset == 0 && filter.limit == 20)
            .returning(|_| Ok((vec![], 0)));

        let service = UserService::new(mock_repo);
        let (_, total) = service.list_users(ListUsersQuery::default()).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_delete_user_not_found() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_delete().returning(|_| Ok(false));

        let service = UserService::new(mock_repo);
        let result = service.delete_user(Uuid::now_v7()).await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user_success() {
        let id = Uuid::now_v7();

        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_delete()
            .with(predicate::eq(id))
            .returning(|_| Ok(true));

        let service = UserService::new(mock_repo);
        assert!(service.delete_user(id).await.is_ok());
    }
}
