/// Account profile endpoints
///
/// # Endpoints
///
/// - `GET /api/users/me` - Fetch own profile
/// - `PUT /api/users/me` - Update own profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::auth::password;
use vitrine_shared::models::user::{Address, UpdateUser, User, UserRole};

/// Profile response; never exposes the password hash
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,

    pub email: String,

    pub name: Option<String>,

    pub role: UserRole,

    pub addresses: Vec<Address>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            addresses: user.addresses.0,
            created_at: user.created_at,
        }
    }
}

/// Update profile request; absent fields are untouched
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password, validated for strength
    pub password: Option<String>,

    pub name: Option<Option<String>>,

    pub addresses: Option<Vec<Address>>,
}

/// Fetch the caller's profile
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Update the caller's profile
///
/// # Errors
///
/// - `400 Bad Request`: Weak password or email already taken
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    req.validate()?;

    let password_hash = match &req.password {
        Some(new_password) => {
            password::validate_password_strength(new_password).map_err(|e| {
                ApiError::ValidationError(vec![ValidationErrorDetail {
                    field: "password".to_string(),
                    message: e,
                }])
            })?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            email: req.email,
            password_hash,
            name: req.name,
            addresses: req.addresses,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
