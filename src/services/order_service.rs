use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    authz::{Access, Operation, authorize, authorize_owner},
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus,
        },
        products::{Column as ProdCol, Entity as Products},
        users::{Entity as Users, Role},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// Row filter applied to order listings, derived from the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Client(Uuid),
    DeliveryPerson(Uuid),
}

impl OrderScope {
    pub fn for_user(user: &AuthUser) -> AppResult<Self> {
        match authorize(user, Operation::ListOrders)? {
            Access::Any => Ok(OrderScope::All),
            Access::Own if user.is(Role::DeliveryPerson) => Ok(OrderScope::DeliveryPerson(user.user_id)),
            Access::Own => Ok(OrderScope::Client(user.user_id)),
            Access::Denied => Err(AppError::Forbidden("Not allowed to list orders".into())),
        }
    }

    fn condition(self) -> Condition {
        match self {
            OrderScope::All => Condition::all(),
            OrderScope::Client(id) => Condition::all().add(OrderCol::ClientId.eq(id)),
            OrderScope::DeliveryPerson(id) => Condition::all().add(OrderCol::LivreurId.eq(id)),
        }
    }
}

/// `CMD-YYYYMMDD-xxxxxxxx`, suffix taken from a fresh v4 id.
pub fn generate_order_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "CMD-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix[..8].to_uppercase()
    )
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("An order needs at least one item".into()));
    }
    if payload.items.iter().any(|i| i.quantity <= 0) {
        return Err(AppError::BadRequest("Item quantity must be positive".into()));
    }
    if payload.items.iter().any(|i| i.unit_price < 0) {
        return Err(AppError::BadRequest("Item unit price cannot be negative".into()));
    }

    let order_number = match payload.order_number.as_deref().map(str::trim) {
        Some(number) if !number.is_empty() => number.to_string(),
        _ => generate_order_number(),
    };
    let total_price = payload
        .items
        .iter()
        .try_fold(0i64, |total, i| {
            i64::from(i.quantity)
                .checked_mul(i.unit_price)
                .and_then(|line| total.checked_add(line))
        })
        .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;

    let txn = state.orm.begin().await?;

    let taken = Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number.as_str()))
        .count(&txn)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!(
            "Order number {order_number} already exists"
        )));
    }

    let product_ids: HashSet<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let known = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.iter().copied()))
        .count(&txn)
        .await?;
    if known as usize != product_ids.len() {
        return Err(AppError::BadRequest("Order references an unknown product".into()));
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        client_name: Set(payload.client_name),
        phone: Set(payload.phone),
        delivery_address: Set(payload.delivery_address),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending),
        client_id: Set(Some(user.user_id)),
        livreur_id: Set(None),
        delivery_notes: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::from_write(err, "Order number already exists"))?;

    let mut items = Vec::with_capacity(payload.items.len());
    for input in payload.items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        client_id = %user.user_id,
        total_price = order.total_price,
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn track_order(
    state: &AppState,
    order_number: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(OrderCol::OrderNumber.eq(order_number.trim()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let mut loaded = attach_items(&state.orm, vec![order]).await?;
    let data = loaded
        .pop()
        .ok_or_else(|| AppError::not_found("Order"))?;
    Ok(ApiResponse::success("Order", data, None))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let scope = OrderScope::for_user(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = scope.condition();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = attach_items(&state.orm, orders).await?;
    Ok(ApiResponse::paged(
        "Orders",
        OrderList { items },
        Meta::new(page, limit, total),
    ))
}

/// Orders still waiting for a delivery person.
pub async fn list_pending(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(user, Operation::ListPendingOrders)?;

    let orders = Orders::find()
        .filter(OrderCol::Status.is_in(OrderStatus::AWAITING_ASSIGNMENT))
        .filter(OrderCol::LivreurId.is_null())
        .order_by_asc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = attach_items(&state.orm, orders).await?;
    Ok(ApiResponse::success(
        "Pending orders",
        OrderList { items },
        Some(Meta::empty()),
    ))
}

/// Any target status is accepted; there is no transition table.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    authorize(user, Operation::UpdateOrderStatus)?;

    let order = find_order(&state.orm, id).await?;
    authorize_owner(user, Operation::UpdateOrderStatus, order.livreur_id)?;

    let previous = order.status;
    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    if let Some(notes) = payload.notes {
        active.delivery_notes = Set(Some(notes));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %updated.id,
        actor = %user.user_id,
        from = ?previous,
        to = ?updated.status,
        "order status updated"
    );

    Ok(ApiResponse::success(
        "Order status updated",
        updated.into(),
        Some(Meta::empty()),
    ))
}

/// Assigning a delivery person moves a pending order to validated.
pub async fn assign_delivery_person(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    livreur_id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_order(&state.orm, id).await?;
    authorize(user, Operation::AssignOrder)?;

    let livreur = Users::find_by_id(livreur_id).one(&state.orm).await?;
    match livreur {
        None => {
            return Err(AppError::BadRequest("Delivery person not found".into()));
        }
        Some(u) if u.role != Role::DeliveryPerson => {
            return Err(AppError::BadRequest(
                "Target user is not a delivery person".into(),
            ));
        }
        Some(u) if !u.is_approved => {
            return Err(AppError::BadRequest(
                "Delivery person is not approved yet".into(),
            ));
        }
        Some(_) => {}
    }

    let next = order.status.after_assignment();
    let mut active: OrderActive = order.into();
    active.livreur_id = Set(Some(livreur_id));
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %updated.id,
        livreur_id = %livreur_id,
        actor = %user.user_id,
        status = ?updated.status,
        "delivery person assigned"
    );

    Ok(ApiResponse::success(
        "Delivery person assigned",
        updated.into(),
        Some(Meta::empty()),
    ))
}

async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

/// Load the items of every order in one query and keep the orders' order.
async fn attach_items<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .all(conn)
        .await?
    {
        grouped
            .entry(item.order_id)
            .or_default()
            .push(OrderItem::from(item));
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: grouped.remove(&order.id).unwrap_or_default(),
            order: order.into(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_numbers_follow_the_pattern() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CMD");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert_ne!(number, generate_order_number());
    }

    #[test]
    fn scope_follows_role() {
        let id = Uuid::new_v4();
        let as_role = |role| AuthUser { user_id: id, role };

        assert_eq!(OrderScope::for_user(&as_role(Role::Admin)).ok(), Some(OrderScope::All));
        assert_eq!(OrderScope::for_user(&as_role(Role::Manager)).ok(), Some(OrderScope::All));
        assert_eq!(
            OrderScope::for_user(&as_role(Role::Client)).ok(),
            Some(OrderScope::Client(id))
        );
        assert_eq!(
            OrderScope::for_user(&as_role(Role::DeliveryPerson)).ok(),
            Some(OrderScope::DeliveryPerson(id))
        );
        assert!(matches!(
            OrderScope::for_user(&as_role(Role::Producer)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            OrderScope::for_user(&as_role(Role::FieldAgent)),
            Err(AppError::Forbidden(_))
        ));
    }
}
