//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sanital_core::{Price, Product, ProductId};

use crate::backend::BackendError;
use crate::catalog::{self, CategoryCount};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub price_formatted: String,
    pub category: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub on_homepage: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            price_formatted: product.price.to_string(),
            category: product.category.clone(),
            image: product.image.clone(),
            gallery: product.gallery.clone(),
            on_homepage: product.on_homepage,
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category filter; `All` or absent means every category.
    pub category: Option<String>,
    /// Search text; takes precedence over `category`.
    pub q: Option<String>,
    /// Maximum search results.
    pub limit: Option<usize>,
}

/// List products, filtered by category or searched by text.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.backend().list_products().await?;

    let selected = match query.q.as_deref() {
        Some(q) => catalog::search(
            &products,
            q,
            query.limit.unwrap_or(catalog::DEFAULT_SEARCH_LIMIT),
        ),
        None => catalog::filter_by_category(&products, query.category.as_deref()),
    };

    Ok(Json(selected.into_iter().map(ProductView::from).collect()))
}

/// Products flagged for the homepage.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = state.backend().list_products().await?;
    Ok(Json(
        catalog::featured(&products, catalog::DEFAULT_FEATURED_LIMIT)
            .into_iter()
            .map(ProductView::from)
            .collect(),
    ))
}

/// Categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let products = state.backend().list_products().await?;
    Ok(Json(catalog::categories(&products)))
}

/// Single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let id = ProductId::new(id);
    match state.backend().get_product(&id).await {
        Ok(product) => Ok(Json(ProductView::from(&product))),
        Err(BackendError::NotFound(_)) => Err(AppError::NotFound(format!("product {id}"))),
        Err(e) => Err(e.into()),
    }
}
