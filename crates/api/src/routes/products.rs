//! Catalog route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use super::Data;
use crate::db::ProductRepository;
use crate::error::Result;
use crate::models::{Product, ProductFilter};
use crate::state::AppState;

/// Display the product listing, optionally filtered by name and category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Data<Vec<Product>>>> {
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(Data { data: products }))
}
