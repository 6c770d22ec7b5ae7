//! Admin route handlers: order management and catalog maintenance.
//!
//! Every handler takes [`RequireAdmin`], so non-admin tokens get a 403 before
//! any of this code runs.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Deserialize;
use tracing::instrument;

use goshop_core::{Money, OrderId, OrderStatus, OrderStatusParseError, ProductId};

use super::{ApiJson, ApiPath, Data, Message, MessageWithData};
use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{DEFAULT_STOCK, NewProduct, Order, Product};
use crate::state::AppState;

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

/// All orders, newest first.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<Data<Vec<Order>>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(Data { data: orders }))
}

/// Move an order to a new status.
#[instrument(skip_all, fields(order_id = %id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<StatusUpdate>,
) -> Result<Json<MessageWithData<Order>>> {
    let status: OrderStatus = request
        .status
        .parse()
        .map_err(|e: OrderStatusParseError| AppError::BadRequest(e.to_string()))?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, status)
        .await?;

    tracing::info!(admin_id = %admin.id, status = %status, "Order status updated");
    add_breadcrumb(
        "admin",
        "Order status updated",
        Some(&[("order_id", &id.to_string()), ("status", status.as_str())]),
    );

    Ok(Json(MessageWithData {
        message: "status updated",
        data: order,
    }))
}

/// Fields collected from the product upload form.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    price: Option<String>,
    category: Option<String>,
    stock: Option<String>,
    image: Option<ImagePart>,
}

#[derive(Debug)]
struct ImagePart {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "name" => form.name = Some(field.text().await?),
                "price" => form.price = Some(field.text().await?),
                "category" => form.category = Some(field.text().await?),
                "stock" => form.stock = Some(field.text().await?),
                "image" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.image = Some(ImagePart {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                other => tracing::debug!(field = %other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Validate the text fields. The image content type is checked by the
    /// store, and the product's image URL is filled in once it is saved.
    fn into_parts(self) -> Result<(NewProduct, ImagePart)> {
        let image = self
            .image
            .filter(|image| !image.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("image is required".to_string()))?;

        let name = required("name", self.name.as_deref())?;
        let category = required("category", self.category.as_deref())?;

        let price: Money = required("price", self.price.as_deref())?
            .parse()
            .map_err(|_| {
                AppError::BadRequest("price must be a non-negative number".to_string())
            })?;

        let stock = match self.stock.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_STOCK,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|stock| *stock >= 0)
                .ok_or_else(|| {
                    AppError::BadRequest("stock must be a non-negative integer".to_string())
                })?,
        };

        Ok((
            NewProduct {
                name: name.to_string(),
                price,
                image: String::new(),
                category: category.to_string(),
                stock,
            },
            image,
        ))
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

/// Create a product from a multipart form with an image.
#[instrument(skip_all)]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Data<Product>>> {
    let form = ProductForm::read(multipart?).await?;
    let (mut product, image) = form.into_parts()?;

    let stored = state
        .uploads()
        .save_image(
            image.file_name.as_deref(),
            image.content_type.as_deref(),
            &image.bytes,
        )
        .await?;
    product.image = stored.url;

    let created = match ProductRepository::new(state.pool()).create(&product).await {
        Ok(created) => created,
        Err(e) => {
            state.uploads().remove_by_url(&product.image).await;
            return Err(e.into());
        }
    };

    tracing::info!(admin_id = %admin.id, product_id = %created.id, "Product created");
    Ok(Json(Data { data: created }))
}

/// Delete a product and its stored image.
///
/// Past order lines keep their copied name and price.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Message>> {
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    state.uploads().remove_by_url(&deleted.image).await;

    tracing::info!(admin_id = %admin.id, "Product deleted");
    Ok(Json(Message {
        message: "product deleted",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(price: &str, stock: Option<&str>) -> ProductForm {
        ProductForm {
            name: Some("Kopi Gayo".to_string()),
            price: Some(price.to_string()),
            category: Some("Minuman".to_string()),
            stock: stock.map(str::to_string),
            image: Some(ImagePart {
                file_name: Some("kopi.png".to_string()),
                content_type: Some("image/png".to_string()),
                bytes: Bytes::from_static(b"\x89PNG"),
            }),
        }
    }

    #[test]
    fn test_stock_defaults_when_omitted() {
        let (product, _) = form("25000", None).into_parts().unwrap();
        assert_eq!(product.stock, DEFAULT_STOCK);
        assert_eq!(product.price, "25000".parse().unwrap());

        let (product, _) = form("25000", Some(" ")).into_parts().unwrap();
        assert_eq!(product.stock, DEFAULT_STOCK);
    }

    #[test]
    fn test_explicit_stock() {
        let (product, _) = form("25000", Some("3")).into_parts().unwrap();
        assert_eq!(product.stock, 3);

        let err = form("25000", Some("-1"))
            .into_parts()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_bad_price_rejected() {
        for price in ["", "gratis", "-100"] {
            let err = form(price, None).into_parts().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "price {price:?}");
        }
    }

    #[test]
    fn test_missing_image_rejected() {
        let mut missing = form("25000", None);
        missing.image = None;
        let err = missing.into_parts().unwrap_err();
        assert_eq!(err.to_string(), "Bad request: image is required");
    }
}
