use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    ai::{
        forecast::{Forecast, ForecastPoint},
        gateway::ChatTurn,
    },
    dto::{
        ai::{ChatRequest, ChatResponse, ForecastResponse},
        auth::{LoginRequest, LoginResponse, SignupRequest},
        dashboard::DashboardSummary,
        field_data::{CreateFieldDataRequest, FieldDataList},
        orders::{
            CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ImageUpload, ProductList, UpdateProductRequest},
        users::{CreateUserRequest, DeliveryPerson, DeliveryPersonList, UpdateUserRequest, UserList},
    },
    entity::{orders::OrderStatus, users::Role},
    models::{FieldData, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{ai, auth, dashboard, field_data, health, orders, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        users::me,
        users::list_users,
        users::create_user,
        users::approve_user,
        users::update_user,
        users::delete_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::upload_image,
        orders::create_order,
        orders::track_order,
        orders::list_orders,
        orders::list_pending,
        orders::list_delivery_persons,
        orders::update_status,
        orders::assign_order,
        field_data::create_field_data,
        field_data::list_field_data,
        dashboard::summary,
        ai::chat,
        ai::chat_public,
        ai::forecast
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            Product,
            Order,
            OrderItem,
            FieldData,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            DeliveryPerson,
            DeliveryPersonList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ImageUpload,
            CreateOrderRequest,
            OrderItemInput,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            CreateFieldDataRequest,
            FieldDataList,
            DashboardSummary,
            ChatTurn,
            ChatRequest,
            ChatResponse,
            Forecast,
            ForecastPoint,
            ForecastResponse,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<Order>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Signup and login"),
        (name = "Users", description = "Account administration"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order lifecycle and delivery assignment"),
        (name = "Field data", description = "Field agent records"),
        (name = "Dashboard", description = "Role-specific counters"),
        (name = "AI", description = "Assistant chat and demand forecast"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
