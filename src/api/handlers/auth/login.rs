//! Login endpoint wiring the authorizer to the session layer.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::authorizer::RequestMeta;
use super::error::AuthError;
use super::session::{page_url, resolve_redirect, session_cookie, SessionClaims};
use super::state::AuthState;
use super::types::{ErrorResponse, LoginRequest, LoginResponse};
use super::utils::{extract_client_ip, extract_user_agent};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing payload or credentials", body = ErrorResponse),
        (status = 401, description = "Credentials rejected", body = ErrorResponse),
        (status = 429, description = "Too many attempts for this email", body = ErrorResponse),
        (status = 500, description = "Login backend unavailable", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let config = auth_state.config();
    let error_redirect = page_url(config.base_url(), &config.pages().error);

    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing payload".to_string(),
                redirect: error_redirect,
            }),
        )
            .into_response();
    };

    let meta = RequestMeta {
        ip_address: extract_client_ip(&headers),
        user_agent: extract_user_agent(&headers),
    };

    let identity = match auth_state
        .authorizer()
        .authorize(&request.email, &request.password, &meta)
        .await
    {
        Ok(identity) => identity,
        Err(err) => {
            if let AuthError::Store(source) = &err {
                error!("Login backend failure: {source:?}");
            }
            let generic = auth_state.authorizer().options().generic_error_messages;
            return (
                err.status(),
                Json(ErrorResponse {
                    error: err.public_message(generic),
                    redirect: error_redirect,
                }),
            )
                .into_response();
        }
    };

    // Token issuance: the session record carries id and role from the identity.
    let claims = SessionClaims::from_identity(&identity);
    let token = match auth_state
        .sessions()
        .insert(&claims, config.session_ttl_seconds())
        .await
    {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to create session: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Login is temporarily unavailable".to_string(),
                    redirect: error_redirect,
                }),
            )
                .into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = session_cookie(config, &token) {
        response_headers.insert(SET_COOKIE, cookie);
    }

    let redirect = resolve_redirect(request.redirect_to.as_deref(), config.base_url());
    (
        StatusCode::OK,
        response_headers,
        Json(LoginResponse {
            user: identity.into(),
            redirect,
        }),
    )
        .into_response()
}
