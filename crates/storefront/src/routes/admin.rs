//! Admin back-office route handlers.
//!
//! Every handler forwards to the backend with the admin's own token; the
//! backend re-checks the role.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::{info, instrument};

use sanital_core::ProductId;

use crate::backend::ProductUpdate;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::import::validate_csv;
use crate::state::AppState;

/// Multipart field carrying the CSV.
const CSV_FIELD: &str = "file";

/// Import products from an uploaded CSV.
#[instrument(skip(state, admin, multipart), fields(user_id = %admin.id))]
pub async fn upload_csv(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("products.csv").to_string();
        let contents = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        validate_csv(&contents)?;
        state
            .backend()
            .upload_products_csv(&admin.token(), &file_name, contents.to_vec())
            .await?;

        info!(file_name = %file_name, bytes = contents.len(), "Catalog CSV imported");
        return Ok(Json(json!({ "message": "Catalog imported", "file": file_name })));
    }

    Err(AppError::BadRequest(format!(
        "multipart field `{CSV_FIELD}` is required"
    )))
}

/// Partially update a product.
#[instrument(skip(state, admin, update), fields(user_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<StatusCode> {
    if update.is_empty() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }

    let id = ProductId::new(id);
    state
        .backend()
        .update_product(&admin.token(), &id, &update)
        .await?;
    info!(product_id = %id, "Product updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a product.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = ProductId::new(id);
    state.backend().delete_product(&admin.token(), &id).await?;
    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
