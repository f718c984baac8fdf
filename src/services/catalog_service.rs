use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CategoryList, ProductList},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSort},
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn get_category_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug.to_lowercase()))
        .filter(CategoryCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(ApiResponse::success("Category", category.into(), None))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(ProdCol::IsAvailable.eq(true));

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(contains_ignore_case(ProdCol::Name, search));
    }

    if let Some(brand) = query.brand.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(contains_ignore_case(ProdCol::Brand, brand));
    }

    // An unknown category slug leaves the category filter off.
    if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let category = Categories::find()
            .filter(CategoryCol::Slug.eq(slug.to_lowercase()))
            .one(&state.orm)
            .await?;
        if let Some(category) = category {
            condition = condition.add(ProdCol::CategoryId.eq(category.id));
        }
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::SellingPrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::SellingPrice.lte(max_price));
    }

    let finder = Products::find().filter(condition);
    let finder = match query.sort.unwrap_or_default() {
        ProductSort::Newest => finder.order_by_desc(ProdCol::CreatedAt),
        ProductSort::PriceAsc => finder.order_by_asc(ProdCol::SellingPrice),
        ProductSort::PriceDesc => finder.order_by_desc(ProdCol::SellingPrice),
        ProductSort::Rating => finder.order_by_desc(ProdCol::RatingAverage),
        ProductSort::Discount => finder.order_by_desc(ProdCol::Discount),
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
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn get_product_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(ProdCol::Slug.eq(slug.to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn list_products_by_category(
    state: &AppState,
    category_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(ProdCol::CategoryId.eq(category_id))
        .filter(ProdCol::IsAvailable.eq(true))
        .order_by_desc(ProdCol::CreatedAt);

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
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// `LOWER(col) LIKE '%needle%'`, portable across Postgres and SQLite.
fn contains_ignore_case(column: ProdCol, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    let pattern = format!("%{}%", needle.to_lowercase());
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}
