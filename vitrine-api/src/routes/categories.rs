/// Category endpoints
///
/// # Endpoints
///
/// - `GET    /api/categories` - List all (public)
/// - `GET    /api/categories/:slug` - Fetch one by slug (public)
/// - `POST   /api/categories` - Create (admin)
/// - `PUT    /api/categories/:id` - Update (admin)
/// - `DELETE /api/categories/:id` - Delete (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use vitrine_shared::models::category::{Category, CreateCategory, UpdateCategory};

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,
}

/// Update category request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,

    pub description: Option<Option<String>>,
}

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = Category::list(&state.db).await?;
    Ok(Json(categories))
}

/// Fetch one category by slug
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Category>> {
    let category = Category::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Create a category (admin)
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    req.validate()?;

    let category = Category::create(
        &state.db,
        CreateCategory {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(category))
}

/// Update a category (admin)
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    if let Some(ref name) = req.name {
        if name.is_empty() {
            return Err(ApiError::BadRequest("Name must not be empty".to_string()));
        }
    }

    let category = Category::update(
        &state.db,
        id,
        UpdateCategory {
            name: req.name,
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Delete a category (admin)
///
/// Products in the category are kept with a NULL category.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = Category::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    Ok(Json(json!({"deleted": true})))
}
