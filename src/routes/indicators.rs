//! # routes::indicators
//!
//! | Method | Path                              | Description                         |
//! |--------|-----------------------------------|-------------------------------------|
//! | GET    | `/api/indicators?category&q`      | Full list, filtered and/or searched |
//! | GET    | `/api/indicators/categories`      | Categories with counts              |
//! | GET    | `/api/indicators/popular?limit`   | Most common indicators              |
//! | GET    | `/api/indicators/:id`             | One indicator                       |

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    indicators::{self, IndicatorCategory, DEFAULT_POPULAR_LIMIT},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

pub async fn list_indicators(Query(query): Query<ListQuery>) -> Result<impl IntoResponse, AppError> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<IndicatorCategory>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let mut docs = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => indicators::search(q),
        _ => indicators::all().iter().collect(),
    };
    if let Some(category) = category {
        docs.retain(|doc| doc.category == category);
    }

    Ok(Json(json!({
        "ok":         true,
        "count":      docs.len(),
        "indicators": docs,
    })))
}

pub async fn list_categories() -> impl IntoResponse {
    Json(json!({
        "ok":         true,
        "categories": indicators::categories(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

pub async fn list_popular(Query(query): Query<PopularQuery>) -> impl IntoResponse {
    let docs = indicators::popular(query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT));
    Json(json!({
        "ok":         true,
        "indicators": docs,
    }))
}

pub async fn get_indicator(Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let doc = indicators::by_id(&id).ok_or_else(|| AppError::NotFound(format!("Unknown indicator '{id}'")))?;
    Ok(Json(json!({ "ok": true, "indicator": doc })))
}
