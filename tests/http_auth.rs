mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use maniocagri_api::{
    dto::products::CreateProductRequest,
    entity::users::{ActiveModel as UserActive, Role},
    middleware::auth::AuthUser,
    routes::create_api_router,
    security::issue_token,
    services::product_service,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

fn app(state: &AppState) -> Router {
    Router::new()
        .nest("/api/v1", create_api_router())
        .with_state(state.clone())
}

fn token_for(state: &AppState, user_id: Uuid, ttl_minutes: i64) -> String {
    issue_token(user_id, &state.config.jwt_secret, ttl_minutes).unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn me(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/v1/users/me");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn valid_token_resolves_the_caller() {
    let env = common::setup().await;
    let state = &env.state;
    let client = common::user(state, "client1", Role::Client).await;

    let (status, body) = send(state, me(Some(&token_for(state, client.user_id, 60)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "client1");
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let env = common::setup().await;
    let state = &env.state;
    let client = common::user(state, "client1", Role::Client).await;

    let (status, _) = send(state, me(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(state, me(Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = token_for(state, client.user_id, -120);
    let (status, _) = send(state, me(Some(&expired))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = token_for(state, Uuid::new_v4(), 60);
    let (status, _) = send(state, me(Some(&unknown))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_account_loses_access() {
    let env = common::setup().await;
    let state = &env.state;
    let client = common::user(state, "client1", Role::Client).await;
    let token = token_for(state, client.user_id, 60);

    UserActive {
        id: Set(client.user_id),
        is_active: Set(false),
        ..Default::default()
    }
    .update(&state.orm)
    .await
    .unwrap();

    let (status, body) = send(state, me(Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Inactive user");
}

async fn seeded_product(state: &AppState, producer: &AuthUser) -> Uuid {
    product_service::create_product(
        state,
        producer,
        CreateProductRequest {
            name: "Gari".into(),
            description: None,
            price: 600,
            stock_quantity: 10,
            image_url: None,
        },
    )
    .await
    .unwrap()
    .into_data()
    .unwrap()
    .id
}

fn product_update(method: Method, id: Uuid, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(format!("/api/v1/products/{id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "price": 650 }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn product_update_is_a_partial_patch() {
    let env = common::setup().await;
    let state = &env.state;
    let producer = common::user(state, "producteur1", Role::Producer).await;
    let id = seeded_product(state, &producer).await;
    let token = token_for(state, producer.user_id, 60);

    let (status, body) = send(state, product_update(Method::PATCH, id, &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 650);
    assert_eq!(body["data"]["name"], "Gari");

    let (status, _) = send(state, product_update(Method::PUT, id, &token)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
