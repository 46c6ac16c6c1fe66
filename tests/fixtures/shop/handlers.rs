//! Item endpoints.

use crate::models::{Item, NewItem, Page};
use axum::extract::{Json, Path, Query};
use axum::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ItemFilter {
    /// Zero-based page number.
    pub page: Option<u32>,
    /// Only items with this label.
    pub tag: Option<String>,
}

/// Returns one item.
///
/// # Arguments
///
/// * `id` - Id of the item
///
/// @title Get an item
pub async fn get_item(#[validate(range(min = 1))] Path(id): Path<u64>) -> Json<Item> {
    todo!()
}

/// Lists the catalog, one page at a time.
pub async fn list_items(Query(filter): Query<ItemFilter>) -> Json<Page<Item>> {
    todo!()
}

/// Creates an item.
pub async fn create_item(Json(item): Json<NewItem>) -> Result<(StatusCode, Json<Item>), StatusCode> {
    todo!()
}

pub async fn delete_item(Path(id): Path<u64>) -> StatusCode {
    todo!()
}
