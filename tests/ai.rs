mod common;

use chrono::{Duration, TimeZone, Utc};
use maniocagri_api::{
    ai::{fallback::SUMMARY_REPLY, forecast::Forecast},
    dto::ai::ChatRequest,
    entity::{
        orders::{ActiveModel as OrderActive, OrderStatus},
        users::Role,
    },
    error::AppError,
    services::ai_service,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

async fn orders_per_day(state: &AppState, per_day: &[u32]) {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    for (day, count) in per_day.iter().enumerate() {
        for n in 0..*count {
            let at = start + Duration::days(day as i64) + Duration::minutes(i64::from(n));
            OrderActive {
                id: Set(Uuid::new_v4()),
                order_number: Set(format!("CMD-{day}-{n}")),
                client_name: Set("Awa".into()),
                phone: Set("+22990000000".into()),
                delivery_address: Set("Cotonou".into()),
                total_price: Set(1200),
                status: Set(OrderStatus::Delivered),
                client_id: Set(None),
                livreur_id: Set(None),
                delivery_notes: Set(None),
                created_at: Set(at.into()),
                updated_at: Set(at.into()),
            }
            .insert(&state.orm)
            .await
            .unwrap();
        }
    }
}

#[tokio::test]
async fn forecast_is_reserved_to_staff() {
    let env = common::setup().await;
    let client = common::user(&env.state, "client1", Role::Client).await;
    let result = ai_service::demand_forecast(&env.state, &client).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn forecast_needs_enough_history() {
    let env = common::setup().await;
    let manager = common::user(&env.state, "gestionnaire1", Role::Manager).await;
    orders_per_day(&env.state, &[2, 1]).await;

    let forecast = ai_service::demand_forecast(&env.state, &manager)
        .await
        .unwrap()
        .into_data()
        .unwrap()
        .forecast;
    assert!(matches!(forecast, Forecast::Diagnostic { .. }));
    assert!(forecast.points().is_empty());
}

#[tokio::test]
async fn forecast_projects_seven_days_after_history() {
    let env = common::setup().await;
    let admin = common::user(&env.state, "admin", Role::Admin).await;
    orders_per_day(&env.state, &[2, 2, 3, 3, 4, 4, 5]).await;

    let forecast = ai_service::demand_forecast(&env.state, &admin)
        .await
        .unwrap()
        .into_data()
        .unwrap()
        .forecast;
    let points = forecast.points();
    assert_eq!(points.len(), 7);
    assert_eq!(
        points[0].date,
        chrono::NaiveDate::from_ymd_opt(2025, 3, 8).unwrap()
    );
    assert!(points.windows(2).all(|w| w[0].predicted_orders <= w[1].predicted_orders));
    assert!(points.iter().all(|p| p.predicted_orders >= 0));
}

#[tokio::test]
async fn offline_chat_answers_locally() {
    let env = common::setup().await;

    let reply = ai_service::chat(
        &env.state,
        ChatRequest {
            prompt: "Donne-moi un résumé de la plateforme".into(),
            history: Vec::new(),
        },
    )
    .await
    .unwrap()
    .into_data()
    .unwrap()
    .response;
    assert_eq!(reply, SUMMARY_REPLY);

    let digest = ai_service::store_digest(&env.state.orm).await.unwrap();
    assert!(digest.products.is_empty());
    assert_eq!(digest.recent_orders, 0);
}

#[tokio::test]
async fn digest_counts_only_the_latest_orders() {
    let env = common::setup().await;
    orders_per_day(&env.state, &[20, 20, 20]).await;

    let digest = ai_service::store_digest(&env.state.orm).await.unwrap();
    assert_eq!(digest.recent_orders, 50);
}
