use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter};

/// Repository trait for User persistence
///
/// No business rules live here; uniqueness pre-checks belong to the service.
/// The backing store's unique constraints remain authoritative either way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return it with server-assigned state
    async fn create(&self, user: User) -> UserResult<User>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Find a user by email, case-insensitively (the stored form is lowercase)
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Find a user by phone; exact match, no normalization
    async fn find_by_phone(&self, phone: &str) -> UserResult<Option<User>>;

    /// List users ordered by creation time descending, plus the filtered total
    async fn list(&self, filter: UserFilter) -> UserResult<(Vec<User>, u64)>;

    /// Persist an already-loaded, mutated user and return the refreshed state
    async fn update(&self, user: User) -> UserResult<User>;

    /// Delete a user by ID; true if a row was removed
    async fn delete(&self, id: Uuid) -> UserResult<bool>;

    /// Check if an email is already taken (case-insensitive)
    async fn exists_by_email(&self, email: &str) -> UserResult<bool>;

    /// Check if a phone is already taken (exact match)
    async fn exists_by_phone(&self, phone: &str) -> UserResult<bool>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        // Both uniqueness invariants are enforced under the write lock
        let email_exists = users
            .values()
            .any(|u| u.email.to_lowercase() == user.email.to_lowercase());

        if email_exists {
            return Err(UserError::DuplicateEmail(user.email));
        }

        if let Some(ref phone) = user.phone {
            let phone_exists = users
                .values()
                .any(|u| u.phone.as_deref() == Some(phone.as_str()));

            if phone_exists {
                return Err(UserError::DuplicatePhone(phone.clone()));
            }
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|u| u.email.to_lowercase() == email.to_lowercase())
            .cloned();
        Ok(user)
    }

    async fn find_by_phone(&self, phone: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        let user = users
            .values()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned();
        Ok(user)
    }

    async fn list(&self, filter: UserFilter) -> UserResult<(Vec<User>, u64)> {
        let users = self.users.read().await;

        let mut matching: Vec<User> = users
            .values()
            .filter(|u| {
                if let Some(active) = filter.is_active {
                    if u.is_active != active {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        // Total reflects the filtered set, not the whole table
        let total = matching.len() as u64;

        // Sort by created_at descending (newest first)
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let items: Vec<User> = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect();

        Ok((items, total))
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id));
        }

        // Re-check uniqueness against all other users
        let email_exists = users
            .values()
            .any(|u| u.id != user.id && u.email.to_lowercase() == user.email.to_lowercase());

        if email_exists {
            return Err(UserError::DuplicateEmail(user.email));
        }

        if let Some(ref phone) = user.phone {
            let phone_exists = users
                .values()
                .any(|u| u.id != user.id && u.phone.as_deref() == Some(phone.as_str()));

            if phone_exists {
                return Err(UserError::DuplicatePhone(phone.clone()));
            }
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let mut users = self.users.write().await;

        if users.remove(&id).is_some() {
            tracing::info!(user_id = %id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        let exists = users
            .values()
            .any(|u| u.email.to_lowercase() == email.to_lowercase());
        Ok(exists)
    }

    async fn exists_by_phone(&self, phone: &str) -> UserResult<bool> {
        let users = self.users.read().await;
        let exists = users.values().any(|u| u.phone.as_deref() == Some(phone));
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn sample_user(email: &str, phone: Option<&str>) -> User {
        User::new(
            email.to_string(),
            "Test".to_string(),
            "User".to_string(),
            phone.map(|p| p.to_string()),
            UserRole::Student,
            "hashed_password".to_string(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo
            .create(sample_user("test@example.com", None))
            .await
            .unwrap();
        assert_eq!(created.email, "test@example.com");

        let fetched = repo.find_by_id(created.id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        repo.create(sample_user("test@example.com", None))
            .await
            .unwrap();

        let fetched = repo.find_by_email("test@example.com").await.unwrap();
        assert!(fetched.is_some());

        let fetched = repo.find_by_email("TEST@EXAMPLE.COM").await.unwrap();
        assert!(fetched.is_some());

        assert!(repo.exists_by_email("TeSt@ExAmPlE.cOm").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(sample_user("test@example.com", None))
            .await
            .unwrap();

        let result = repo.create(sample_user("test@example.com", None)).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_duplicate_phone_error() {
        let repo = InMemoryUserRepository::new();
        repo.create(sample_user("first@example.com", Some("+15551234567")))
            .await
            .unwrap();

        let result = repo
            .create(sample_user("second@example.com", Some("+15551234567")))
            .await;
        assert!(matches!(result, Err(UserError::DuplicatePhone(_))));

        // A missing phone never collides
        repo.create(sample_user("third@example.com", None))
            .await
            .unwrap();
        repo.create(sample_user("fourth@example.com", None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let repo = InMemoryUserRepository::new();
        repo.create(sample_user("taken@example.com", None))
            .await
            .unwrap();
        let mut victim = repo
            .create(sample_user("victim@example.com", None))
            .await
            .unwrap();

        victim.email = "taken@example.com".to_string();
        let result = repo.update(victim).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_own_unique_values() {
        let repo = InMemoryUserRepository::new();
        let mut user = repo
            .create(sample_user("keep@example.com", Some("+15550000001")))
            .await
            .unwrap();

        // Updating unrelated fields must not trip the uniqueness checks
        user.first_name = "Changed".to_string();
        let updated = repo.update(user).await.unwrap();
        assert_eq!(updated.first_name, "Changed");
        assert_eq!(updated.phone.as_deref(), Some("+15550000001"));
    }

    #[tokio::test]
    async fn test_list_orders_newest_first_and_paginates() {
        let repo = InMemoryUserRepository::new();

        for i in 0..5 {
            let mut user = sample_user(&format!("user{}@example.com", i), None);
            // Spread creation times so ordering is unambiguous
            user.created_at += chrono::Duration::seconds(i);
            user.updated_at = user.created_at;
            repo.create(user).await.unwrap();
        }

        let (page1, total) = repo
            .list(UserFilter {
                is_active: None,
                limit: 2,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].email, "user4@example.com");
        assert_eq!(page1[1].email, "user3@example.com");

        let (page2, _) = repo
            .list(UserFilter {
                is_active: None,
                limit: 2,
                offset: 2,
            })
            .await
            .unwrap();

        assert_eq!(page2[0].email, "user2@example.com");
        assert_eq!(page2[1].email, "user1@example.com");
    }

    #[tokio::test]
    async fn test_list_total_reflects_active_filter() {
        let repo = InMemoryUserRepository::new();

        for i in 0..4 {
            let mut user = sample_user(&format!("user{}@example.com", i), None);
            user.is_active = i % 2 == 0;
            repo.create(user).await.unwrap();
        }

        let (items, total) = repo
            .list(UserFilter {
                is_active: Some(true),
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|u| u.is_active));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .create(sample_user("gone@example.com", None))
            .await
            .unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }
}
