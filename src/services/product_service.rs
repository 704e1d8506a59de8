use uuid::Uuid;

use crate::{
    dto::products::{ProductDetail, ProductList, SearchHit, SearchResults},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        products::{Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

const SEARCH_LIMIT: u64 = 5;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category.as_str()));
    }

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(format!("%{}%", search)));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::paged("Products", ProductList { items }, meta))
}

/// Product detail; an authenticated caller also sees what is already in their cart.
pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let cart_quantity = match viewer {
        Some(user) => CartItems::find()
            .filter(CartCol::UserId.eq(user.user_id))
            .filter(CartCol::ProductId.eq(product.id))
            .one(&state.orm)
            .await?
            .map(|line| line.quantity),
        None => None,
    };

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product.into(),
            cart_quantity,
        },
        None,
    ))
}

pub async fn search(state: &AppState, q: Option<&str>) -> AppResult<ApiResponse<SearchResults>> {
    let Some(q) = q.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(ApiResponse::ok(SearchResults { results: vec![] }));
    };

    let results = Products::find()
        .filter(Expr::col(Column::Name).ilike(format!("%{}%", q)))
        .order_by_asc(Column::Name)
        .limit(SEARCH_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| SearchHit {
            id: p.id,
            name: p.name,
        })
        .collect();

    Ok(ApiResponse::ok(SearchResults { results }))
}
