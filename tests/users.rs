mod common;

use maniocagri_api::{
    dto::{
        auth::{LoginRequest, SignupRequest},
        users::{CreateUserRequest, UpdateUserRequest},
    },
    entity::users::Role,
    error::AppError,
    routes::params::Pagination,
    security::decode_token,
    services::{auth_service, dashboard_service, user_service},
};

fn signup(username: &str, role: Option<Role>) -> SignupRequest {
    SignupRequest {
        username: username.into(),
        email: format!("{username}@maniocagri.test"),
        password: "secret".into(),
        role,
        first_name: None,
        last_name: None,
        phone: None,
    }
}

fn login(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn only_clients_are_approved_at_signup() {
    let env = common::setup().await;
    let state = &env.state;

    let client = auth_service::signup(state, signup("client1", None))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(client.role, Role::Client);
    assert!(client.is_approved);

    for (name, role) in [
        ("producteur1", Role::Producer),
        ("agent1", Role::FieldAgent),
        ("livreur1", Role::DeliveryPerson),
        ("gestionnaire1", Role::Manager),
    ] {
        let staff = auth_service::signup(state, signup(name, Some(role)))
            .await
            .unwrap()
            .into_data()
            .unwrap();
        assert!(!staff.is_approved, "{name} should wait for approval");
    }

    let manager = common::user(state, "admin", Role::Manager).await;
    let created = user_service::create_user(
        state,
        &manager,
        CreateUserRequest {
            username: "livreur2".into(),
            email: "livreur2@maniocagri.test".into(),
            password: "secret".into(),
            role: Role::DeliveryPerson,
            is_active: None,
            first_name: Some("Yao".into()),
            last_name: None,
            phone: None,
        },
    )
    .await
    .unwrap()
    .into_data()
    .unwrap();
    assert!(created.is_approved);
    assert!(created.is_active);
}

#[tokio::test]
async fn username_and_email_are_unique() {
    let env = common::setup().await;
    let state = &env.state;
    auth_service::signup(state, signup("client1", None)).await.unwrap();

    let same_name = auth_service::signup(
        state,
        SignupRequest {
            email: "other@maniocagri.test".into(),
            ..signup("client1", None)
        },
    )
    .await;
    assert!(matches!(same_name, Err(AppError::Conflict(_))));

    let same_email = auth_service::signup(
        state,
        SignupRequest {
            email: "CLIENT1@maniocagri.test".into(),
            ..signup("client9", None)
        },
    )
    .await;
    assert!(matches!(same_email, Err(AppError::Conflict(_))));

    let admin = common::user(state, "admin", Role::Admin).await;
    let other = common::user(state, "client2", Role::Client).await;
    let clash = user_service::update_user(
        state,
        &admin,
        other.user_id,
        UpdateUserRequest {
            username: Some("client1".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn login_issues_a_token_for_active_accounts() {
    let env = common::setup().await;
    let state = &env.state;
    let user = auth_service::signup(state, signup("client1", None))
        .await
        .unwrap()
        .into_data()
        .unwrap();

    let token = auth_service::login(state, login("client1", "secret"))
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(token.token_type, "bearer");
    assert_eq!(decode_token(&token.token, &state.config.jwt_secret).unwrap(), user.id);

    let wrong = auth_service::login(state, login("client1", "nope")).await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));
    let unknown = auth_service::login(state, login("ghost", "secret")).await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    let admin = common::user(state, "admin", Role::Admin).await;
    user_service::update_user(
        state,
        &admin,
        user.id,
        UpdateUserRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let inactive = auth_service::login(state, login("client1", "secret")).await;
    assert!(matches!(inactive, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn password_updates_are_rehashed() {
    let env = common::setup().await;
    let state = &env.state;
    let admin = common::user(state, "admin", Role::Admin).await;
    let agent = common::user(state, "agent1", Role::FieldAgent).await;

    user_service::update_user(
        state,
        &admin,
        agent.user_id,
        UpdateUserRequest {
            password: Some("nouveau".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(auth_service::login(state, login("agent1", "pass")).await.is_err());
    assert!(auth_service::login(state, login("agent1", "nouveau")).await.is_ok());
}

#[tokio::test]
async fn approval_and_listing_are_staff_only() {
    let env = common::setup().await;
    let state = &env.state;
    let manager = common::user(state, "gestionnaire1", Role::Manager).await;
    let producer = common::user(state, "producteur1", Role::Producer).await;
    let pending = auth_service::signup(state, signup("livreur1", Some(Role::DeliveryPerson)))
        .await
        .unwrap()
        .into_data()
        .unwrap();

    let denied = user_service::approve_user(state, &producer, pending.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let before = user_service::list_delivery_persons(state, &manager)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert!(before.items.is_empty());

    let approved = user_service::approve_user(state, &manager, pending.id)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert!(approved.is_approved);

    let after = user_service::list_delivery_persons(state, &manager)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(after.items.len(), 1);
    assert_eq!(after.items[0].username, "livreur1");

    let listed = user_service::list_users(state, &manager, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.meta.as_ref().and_then(|m| m.total), Some(3));
    assert!(matches!(
        user_service::list_users(state, &producer, Pagination::default()).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn deletion_rules() {
    let env = common::setup().await;
    let state = &env.state;
    let admin = common::user(state, "admin", Role::Admin).await;
    let second_admin = common::user(state, "admin2", Role::Admin).await;
    let manager = common::user(state, "gestionnaire1", Role::Manager).await;
    let client = common::user(state, "client1", Role::Client).await;

    let own = user_service::delete_user(state, &manager, manager.user_id).await;
    assert!(matches!(own, Err(AppError::BadRequest(_))));

    let admin_by_manager = user_service::delete_user(state, &manager, admin.user_id).await;
    assert!(matches!(admin_by_manager, Err(AppError::Forbidden(_))));

    let by_client = user_service::delete_user(state, &client, manager.user_id).await;
    assert!(matches!(by_client, Err(AppError::Forbidden(_))));

    user_service::delete_user(state, &admin, second_admin.user_id)
        .await
        .unwrap();
    user_service::delete_user(state, &manager, client.user_id)
        .await
        .unwrap();

    let gone = user_service::delete_user(state, &admin, client.user_id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn dashboard_counters_follow_role() {
    let env = common::setup().await;
    let state = &env.state;
    let admin = common::user(state, "admin", Role::Admin).await;
    let client = common::user(state, "client1", Role::Client).await;
    auth_service::signup(state, signup("producteur1", Some(Role::Producer)))
        .await
        .unwrap();

    let summary = dashboard_service::summary(state, &admin)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(summary.total_users, Some(3));
    assert_eq!(summary.unapproved_users, Some(1));
    assert_eq!(summary.total_orders, Some(0));
    assert_eq!(summary.my_orders_count, None);

    let summary = dashboard_service::summary(state, &client)
        .await
        .unwrap()
        .into_data()
        .unwrap();
    assert_eq!(summary.my_orders_count, Some(0));
    assert_eq!(summary.total_users, None);
}
