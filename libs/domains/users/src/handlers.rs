use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::extractors::{UuidPath, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

use crate::error::UserError;
use crate::models::{
    ChangePassword, CreateUser, ListUsersQuery, LoginRequest, UpdateUser, UserListResponse,
    UserResponse, UserRole,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        change_password,
        login
    ),
    components(schemas(
        ChangePassword,
        CreateUser,
        ListUsersQuery,
        LoginRequest,
        UpdateUser,
        UserListResponse,
        UserResponse,
        UserRole
    )),
    tags((name = "users", description = "User account management"))
)]
pub struct ApiDoc;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/change-password", post(change_password))
        .route("/login", post(login))
        .with_state(shared_service)
}

/// List users with pagination
///
/// GET /users?page=1&page_size=20&is_active=true
#[utoipa::path(
    get,
    path = "/",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Paginated list of users", body = UserListResponse),
        (status = 400, description = "Invalid query parameters")
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>, UserError> {
    // Page bounds are a transport concern; the service takes any page size
    query
        .validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let page = query.page;
    let page_size = query.page_size;
    let (items, total) = service.list_users(query).await?;

    Ok(Json(UserListResponse {
        items,
        total,
        page,
        page_size,
        total_pages: total.div_ceil(page_size),
    }))
}

/// Create a new user
///
/// POST /users
#[utoipa::path(
    post,
    path = "/",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email or phone already in use")
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), UserError> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
///
/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> Result<Json<UserResponse>, UserError> {
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Update a user
///
/// PUT /users/{id} with a partial payload; absent fields stay untouched
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or phone already in use")
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> Result<Json<UserResponse>, UserError> {
    let user = service.update_user(id, input).await?;
    Ok(Json(user))
}

/// Delete a user
///
/// DELETE /users/{id}
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> Result<StatusCode, UserError> {
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change a user's password
///
/// POST /users/{id}/change-password
#[utoipa::path(
    post,
    path = "/{id}/change-password",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = UserResponse),
        (status = 401, description = "Current password is wrong"),
        (status = 404, description = "User not found")
    )
)]
async fn change_password<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ChangePassword>,
) -> Result<Json<UserResponse>, UserError> {
    let user = service
        .change_password(id, &input.current_password, &input.new_password)
        .await?;
    Ok(Json(user))
}

/// Verify credentials and return the account
///
/// POST /users/login
#[utoipa::path(
    post,
    path = "/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials valid", body = UserResponse),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 403, description = "Account deactivated")
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Json<UserResponse>, UserError> {
    let user = service
        .verify_credentials(&input.email, &input.password)
        .await?;
    Ok(Json(user))
}
