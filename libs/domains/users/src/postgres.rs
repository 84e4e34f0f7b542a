use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entity::{Column, Entity as Users};
use crate::error::{UserError, UserResult};
use crate::models::{User, UserFilter};
use crate::repository::UserRepository;

/// PostgreSQL implementation of UserRepository using SeaORM entities
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Translate unique-constraint violations into domain errors.
///
/// The service pre-checks uniqueness, but a concurrent insert can still hit
/// the database constraint. That loser must surface as a duplicate, not as
/// an internal error.
fn map_write_error(e: DbErr, user: &User) -> UserError {
    let msg = e.to_string();
    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        if msg.contains("users_phone_key") {
            if let Some(phone) = &user.phone {
                return UserError::DuplicatePhone(phone.clone());
            }
        }
        return UserError::DuplicateEmail(user.email.clone());
    }
    UserError::Internal(format!("Database error: {}", e))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let active: crate::entity::ActiveModel = user.clone().into();

        let model = active
            .insert(&self.db)
            .await
            .map_err(|e| map_write_error(e, &user))?;

        tracing::info!(user_id = %model.id, email = %model.email, "Created user");
        Ok(model.into())
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        // The stored form is lowercase, so a normalized equality match suffices
        let model = Users::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn find_by_phone(&self, phone: &str) -> UserResult<Option<User>> {
        let model = Users::find()
            .filter(Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: UserFilter) -> UserResult<(Vec<User>, u64)> {
        let mut query = Users::find();

        if let Some(active) = filter.is_active {
            query = query.filter(Column::IsActive.eq(active));
        }

        // Total reflects the filtered set, not the whole table
        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        let models = query
            .order_by_desc(Column::CreatedAt)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let active: crate::entity::ActiveModel = user.clone().into();

        let model = active.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => UserError::NotFound(user.id),
            other => map_write_error(other, &user),
        })?;

        tracing::info!(user_id = %model.id, "Updated user");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        let deleted = result.rows_affected > 0;
        if deleted {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(deleted)
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        let count = Users::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .count(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(count > 0)
    }

    async fn exists_by_phone(&self, phone: &str) -> UserResult<bool> {
        let count = Users::find()
            .filter(Column::Phone.eq(phone))
            .count(&self.db)
            .await
            .map_err(|e| UserError::Internal(format!("Database error: {}", e)))?;

        Ok(count > 0)
    }
}
