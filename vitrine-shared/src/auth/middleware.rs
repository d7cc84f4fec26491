/// Authentication context for Axum handlers
///
/// The API crate's JWT layer validates the Bearer token and inserts an
/// [`AuthContext`] into request extensions. Handlers extract it with Axum's
/// `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use vitrine_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role carried in the validated token
    pub role: UserRole,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_jwt(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Whether this context belongs to an admin
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns an error unless the context belongs to an admin
    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AuthError::AdminRequired)
        }
    }

    /// Whether this context may act on resources owned by `owner_id`
    ///
    /// Owners and admins both pass; everyone else is rejected.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Route requires the admin role
    AdminRequired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::AdminRequired => (
                StatusCode::FORBIDDEN,
                "Admin privileges required".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": "auth_error",
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_check() {
        let admin = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Admin);
        let customer = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Customer);

        assert!(admin.is_admin());
        assert!(admin.require_admin().is_ok());
        assert!(!customer.is_admin());
        assert!(customer.require_admin().is_err());
    }

    #[test]
    fn test_ownership_check() {
        let owner_id = Uuid::new_v4();
        let owner = AuthContext::from_jwt(owner_id, UserRole::Customer);
        let other = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Customer);
        let admin = AuthContext::from_jwt(Uuid::new_v4(), UserRole::Admin);

        assert!(owner.can_access(owner_id));
        assert!(!other.can_access(owner_id));
        assert!(admin.can_access(owner_id));
    }
}
