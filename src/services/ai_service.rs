use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    ai::{
        forecast::{self, OrderSample},
        gateway::{CATALOG_LIMIT, ProductDigest, StoreDigest},
    },
    authz::{Operation, authorize},
    db::OrmConn,
    dto::ai::{ChatRequest, ChatResponse, ForecastResponse},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    state::AppState,
};

/// How many of the latest orders are counted into the assistant context.
const RECENT_ORDERS: u64 = 50;

/// Catalog and order snapshot handed to the assistant. A store failure
/// only removes the context, the chat still proceeds.
pub async fn store_digest(orm: &OrmConn) -> Option<StoreDigest> {
    let products = Products::find()
        .order_by_asc(ProdCol::Name)
        .limit(CATALOG_LIMIT as u64)
        .all(orm)
        .await;
    let products = match products {
        Ok(products) => products,
        Err(err) => {
            tracing::warn!(error = %err, "could not load catalog for assistant context");
            return None;
        }
    };

    let recent_orders = Orders::find()
        .select_only()
        .column(OrderCol::Id)
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .into_tuple::<Uuid>()
        .all(orm)
        .await
        .map(|ids| ids.len())
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not count orders for assistant context");
            0
        });

    Some(StoreDigest {
        products: products
            .into_iter()
            .map(|p| ProductDigest {
                name: p.name,
                price: p.price,
                stock_quantity: p.stock_quantity,
            })
            .collect(),
        recent_orders,
    })
}

/// Shared by the authenticated and the public chat endpoints.
pub async fn chat(state: &AppState, payload: ChatRequest) -> AppResult<ApiResponse<ChatResponse>> {
    let digest = store_digest(&state.orm).await;
    let response = state
        .ai
        .ask(&payload.prompt, &payload.history, digest.as_ref())
        .await;
    Ok(ApiResponse::success("Assistant reply", ChatResponse { response }, None))
}

pub async fn demand_forecast(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ForecastResponse>> {
    authorize(user, Operation::ViewForecast)?;

    let samples: Vec<OrderSample> = Orders::find()
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|o| OrderSample {
            created_at: o.created_at.into(),
            total_price: o.total_price,
        })
        .collect();

    let forecast = forecast::predict(&samples);
    tracing::debug!(orders = samples.len(), points = forecast.points().len(), "demand forecast computed");

    Ok(ApiResponse::success("Demand forecast", ForecastResponse { forecast }, None))
}
