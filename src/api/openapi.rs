//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::session::session,
        crate::api::handlers::auth::session::logout,
    ),
    components(schemas(
        crate::api::handlers::auth::types::LoginRequest,
        crate::api::handlers::auth::types::LoginResponse,
        crate::api::handlers::auth::types::IdentityResponse,
        crate::api::handlers::auth::types::ErrorResponse,
        crate::api::handlers::auth::types::SessionResponse,
        crate::api::handlers::auth::types::LogoutResponse,
    )),
    tags(
        (name = "auth", description = "Credential login and session endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
