/// User endpoints: registration, sessions, profile and avatar
///
/// # Endpoints
///
/// - `POST /users` - register, returns the user view and a session token
/// - `POST /users/login` - credential check, returns view and token
/// - `POST /users/logout` - revokes the presented token only
/// - `POST /users/logoutAll` - revokes every session
/// - `GET /users/me` - current user view
/// - `PATCH /users/me` - profile update, allowed fields only
/// - `DELETE /users/me` - account deletion with task cascade
/// - `POST /users/me/avatar` - avatar upload (multipart, ≤ 1 MB, png/jpg)
/// - `DELETE /users/me/avatar` - clears the avatar
/// - `GET /users/:id/avatar` - public avatar fetch
///
/// Responses never include the password hash, the token set or the avatar
/// blob: the only serialized user representation is the public view.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskvault_shared::auth::gate::Authenticated;
use taskvault_shared::models::user::{NewAccount, ProfileUpdate, UserView};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Largest accepted avatar payload, matching the original upload cap
const AVATAR_MAX_BYTES: usize = 1_000_000;

/// Response for registration and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Public view of the user
    pub user: UserView,

    /// Freshly issued session token
    pub token: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registers a new account and opens its first session
///
/// # Errors
///
/// - `400 Bad Request`: validation failed (email format, negative age,
///   weak password, email already in use)
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewAccount>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(account) = payload.map_err(ApiError::from_rejection)?;

    let user = state.accounts.register(account).await?;
    let token = state.sessions.issue(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.view(),
            token,
        }),
    ))
}

/// Resolves credentials and opens a new session
///
/// A second login from another device coexists with earlier sessions;
/// nothing is invalidated here.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password, reported
///   identically
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload.map_err(ApiError::from_rejection)?;

    let user = state
        .accounts
        .find_by_credentials(&req.email, &req.password)
        .await?;
    let token = state.sessions.issue(user.id).await?;

    Ok(Json(AuthResponse {
        user: user.view(),
        token,
    }))
}

/// Revokes the session token presented on this request
///
/// Other sessions of the same user stay live.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
) -> ApiResult<StatusCode> {
    state.sessions.revoke(auth.user.id, &auth.token).await?;
    Ok(StatusCode::OK)
}

/// Revokes every session token of the current user
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
) -> ApiResult<StatusCode> {
    state.sessions.revoke_all(auth.user.id).await?;
    Ok(StatusCode::OK)
}

/// Returns the current user's public view
pub async fn me(Extension(auth): Extension<Authenticated>) -> Json<UserView> {
    Json(auth.user.view())
}

/// Applies a profile update limited to {name, email, password, age}
///
/// # Errors
///
/// - `400 Bad Request`: unknown field in the body, or a field failing
///   validation
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserView>> {
    let Json(changes) = payload.map_err(ApiError::from_rejection)?;

    let user = state.accounts.update_profile(auth.user, changes).await?;
    Ok(Json(user.view()))
}

/// Deletes the current account and every task it owns
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
) -> ApiResult<Json<UserView>> {
    state.accounts.delete_account(&auth.user).await?;
    Ok(Json(auth.user.view()))
}

/// Stores a new avatar for the current user
///
/// Accepts a multipart field named `avatar` with a png/jpg/jpeg filename,
/// at most 1 MB. The bytes are stored verbatim; no resizing or conversion
/// happens server-side.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid("avatar", e.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let supported = field
            .file_name()
            .map(has_supported_image_extension)
            .unwrap_or(false);
        if !supported {
            return Err(ApiError::invalid("avatar", "Please upload an image"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid("avatar", e.to_string()))?;
        if bytes.len() > AVATAR_MAX_BYTES {
            return Err(ApiError::invalid("avatar", "Image must be 1 MB or smaller"));
        }

        state.accounts.set_avatar(auth.user.id, bytes.to_vec()).await?;
        return Ok(StatusCode::OK);
    }

    Err(ApiError::invalid("avatar", "Avatar field is required"))
}

/// Clears the current user's avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<Authenticated>,
) -> ApiResult<StatusCode> {
    state.accounts.clear_avatar(auth.user.id).await?;
    Ok(StatusCode::OK)
}

/// Serves a user's avatar image (public)
///
/// A missing user, an unparsable id and a user without an avatar all
/// produce the same 404.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound)?;

    let avatar = state
        .users
        .find_user_by_id(id)
        .await?
        .and_then(|u| u.avatar)
        .ok_or(ApiError::NotFound)?;

    let content_type = sniff_image_content_type(&avatar);
    Ok(([(header::CONTENT_TYPE, content_type)], avatar).into_response())
}

fn has_supported_image_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".png") || lower.ends_with(".jpg") || lower.ends_with(".jpeg")
}

/// Distinguishes the two accepted formats by magic bytes
fn sniff_image_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    }
}
