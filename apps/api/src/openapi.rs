//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Campus API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus API",
        version = "0.1.0",
        description = "User account management API",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/users", api = domain_users::ApiDoc)
    ),
    tags(
        (name = "users", description = "User account management endpoints")
    )
)]
pub struct ApiDoc;
