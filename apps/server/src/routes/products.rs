//! Clothing inventory: product CRUD, search and the stock overview.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use barbearia_core::stats::InventoryOverview;
use barbearia_core::{CoreError, ProductInput, ProductView};
use barbearia_db::ProductQuery;
use serde::Deserialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub q: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/inventory", get(inventory))
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> ApiResult<Json<Vec<ProductView>>> {
    let query = ProductQuery {
        term: params.q,
        category: params.category,
        low_stock_only: params.low_stock,
    };
    let products = state.db.products().search(&query).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ProductView>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product.into()))
}

async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let product = state.db.products().create(&input).await?;
    info!(id = %product.id, name = %product.name, stock = product.total_stock(), "Product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<ProductView>> {
    Ok(Json(state.db.products().update(&id, &input).await?.into()))
}

/// Deactivates the product; past sales keep pointing at it.
async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    info!(id = %id, "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

async fn inventory(State(state): State<AppState>) -> ApiResult<Json<InventoryOverview>> {
    Ok(Json(state.db.reports().inventory_overview().await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{get, post, send, state};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    fn camiseta() -> Value {
        json!({
            "name": "Camiseta Básica",
            "category": "Camisetas",
            "price": 4990,
            "costPrice": 2000,
            "brand": "Hering",
            "stock": { "pp": 1, "p": 1, "m": 1, "g": 0, "gg": 0 }
        })
    }

    #[tokio::test]
    async fn test_crud_and_soft_delete() {
        let state = state().await;
        let (status, created) = post(&state, "/api/products", camiseta()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["version"], 1);
        assert_eq!(created["totalStock"], 3);
        assert_eq!(created["lowStock"], true);
        let id = created["id"].as_str().unwrap().to_string();

        let mut edit = camiseta();
        edit["stock"]["g"] = json!(10);
        let (status, updated) = send(&state, Method::PUT, &format!("/api/products/{id}"), Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["stock"]["g"], 10);
        assert_eq!(updated["version"], 2);
        assert_eq!(updated["totalStock"], 13);
        assert_eq!(updated["lowStock"], false);

        let (status, _) = send(&state, Method::DELETE, &format!("/api/products/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, listed) = get(&state, "/api/products").await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_and_inventory() {
        let state = state().await;
        post(&state, "/api/products", camiseta()).await;
        let mut bermuda = camiseta();
        bermuda["name"] = json!("Bermuda Jeans");
        bermuda["category"] = json!("Bermudas");
        bermuda["stock"] = json!({ "pp": 5, "p": 5, "m": 5, "g": 5, "gg": 5 });
        post(&state, "/api/products", bermuda).await;

        let (_, by_brand) = get(&state, "/api/products?q=hering").await;
        assert_eq!(by_brand.as_array().unwrap().len(), 2);

        let (_, low) = get(&state, "/api/products?low_stock=true").await;
        assert_eq!(low.as_array().unwrap().len(), 1);
        assert_eq!(low[0]["name"], "Camiseta Básica");

        let (_, category) = get(&state, "/api/products?category=Bermudas").await;
        assert_eq!(category[0]["name"], "Bermuda Jeans");
        assert_eq!(category[0]["totalStock"], 25);

        let (status, overview) = get(&state, "/api/inventory").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(overview["productCount"], 2);
        assert_eq!(overview["totalUnits"], 28);
        assert_eq!(overview["lowStock"].as_array().unwrap().len(), 1);
        assert_eq!(overview["lowStock"][0]["totalStock"], 3);
        assert_eq!(overview["lowStock"][0]["lowStock"], true);
    }

    #[tokio::test]
    async fn test_product_reports_total_stock() {
        let state = state().await;
        let mut body = camiseta();
        body["stock"] = json!({ "pp": 5, "p": 10, "m": 20, "g": 15, "gg": 5 });
        let (_, created) = post(&state, "/api/products", body).await;
        let id = created["id"].as_str().unwrap();

        let (status, fetched) = get(&state, &format!("/api/products/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["totalStock"], 55);
        assert_eq!(fetched["lowStock"], false);
        assert_eq!(fetched["stock"]["m"], 20);
    }

    #[tokio::test]
    async fn test_oversized_values_are_rejected() {
        let state = state().await;

        let mut huge_stock = camiseta();
        huge_stock["stock"] = json!({ "pp": i64::MAX, "p": 1, "m": 0, "g": 0, "gg": 0 });
        let (status, body) = post(&state, "/api/products", huge_stock).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let mut huge_price = camiseta();
        huge_price["price"] = json!(i64::MAX / 2);
        let (status, _) = post(&state, "/api/products", huge_price).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_negative_stock_is_rejected() {
        let state = state().await;
        let mut bad = camiseta();
        bad["stock"]["m"] = json!(-1);
        let (status, body) = post(&state, "/api/products", bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
