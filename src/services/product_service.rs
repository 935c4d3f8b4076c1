use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    authz::{Operation, authorize, authorize_owner},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
    storage::image_extension,
};

const DUPLICATE_NAME: &str = "A product with this name already exists";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::Name) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
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

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find_product(state, id).await?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Operation::CreateProduct)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    validate_amounts(Some(payload.price), Some(payload.stock_quantity))?;
    ensure_name_free(state, &name, None).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock_quantity: Set(payload.stock_quantity),
        image_url: Set(payload.image_url),
        producer_id: Set(Some(user.user_id)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from_write(err, DUPLICATE_NAME))?;

    tracing::info!(product_id = %product.id, producer_id = %user.user_id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(state, id).await?;
    authorize_owner(user, Operation::UpdateProduct, existing.producer_id)?;
    validate_amounts(payload.price, payload.stock_quantity)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Product name is required".into()));
        }
        ensure_name_free(state, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::from_write(err, DUPLICATE_NAME))?;

    tracing::info!(product_id = %updated.id, actor = %user.user_id, "product updated");

    Ok(ApiResponse::success(
        "Product updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

/// Products already referenced by an order line cannot be removed.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(state, id).await?;
    authorize_owner(user, Operation::DeleteProduct, existing.producer_id)?;

    let referenced = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "This product appears in existing orders and cannot be deleted".into(),
        ));
    }

    let image = existing.image_url.clone();
    let deleted: Product = existing.clone().into();
    existing.delete(&state.orm).await.map_err(|err| {
        AppError::from_write(
            err,
            "This product appears in existing orders and cannot be deleted",
        )
    })?;

    if let Some(image) = image {
        state.images.remove(&image).await;
    }

    tracing::info!(product_id = %id, actor = %user.user_id, "product deleted");

    Ok(ApiResponse::success(
        "Product deleted",
        deleted,
        Some(Meta::empty()),
    ))
}

/// Stores a new product image and replaces the previous one.
pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    file_name: &str,
    bytes: &[u8],
) -> AppResult<ApiResponse<Product>> {
    authorize(user, Operation::UploadProductImage)?;
    let existing = find_product(state, id).await?;

    let extension = image_extension(file_name)?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }

    let stored = state.images.save(&extension, bytes).await?;
    let previous = existing.image_url.clone();

    let mut active: ActiveModel = existing.into();
    active.image_url = Set(Some(stored.clone()));
    let updated = match active.update(&state.orm).await {
        Ok(model) => model,
        Err(err) => {
            state.images.remove(&stored).await;
            return Err(err.into());
        }
    };

    if let Some(previous) = previous.filter(|p| *p != stored) {
        state.images.remove(&previous).await;
    }

    tracing::info!(product_id = %updated.id, image = %stored, "product image uploaded");

    Ok(ApiResponse::success(
        "Image uploaded",
        updated.into(),
        Some(Meta::empty()),
    ))
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.count(&state.orm).await? > 0 {
        return Err(AppError::Conflict(DUPLICATE_NAME.into()));
    }
    Ok(())
}

fn validate_amounts(price: Option<i64>, stock: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("Stock quantity cannot be negative".into()));
    }
    Ok(())
}
