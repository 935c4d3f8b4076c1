use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, SignupRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Role},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    security::{hash_password, issue_token, verify_password},
    state::AppState,
};

/// Fields shared by public signup and staff-created accounts.
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
    pub is_approved: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Insert a user after checking username and email are free.
pub async fn insert_account(state: &AppState, account: NewAccount) -> AppResult<User> {
    let username = account.username.trim().to_string();
    let email = account.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("Username and email are required".into()));
    }
    if account.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let existing = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(username.as_str()))
                .add(UserCol::Email.eq(email.as_str())),
        )
        .one(&state.orm)
        .await?;
    if let Some(existing) = existing {
        let message = if existing.username == username {
            "A user with this username already exists"
        } else {
            "A user with this email already exists"
        };
        return Err(AppError::Conflict(message.into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&account.password)?),
        role: Set(account.role),
        is_active: Set(account.is_active),
        is_approved: Set(account.is_approved),
        first_name: Set(account.first_name),
        last_name: Set(account.last_name),
        phone: Set(account.phone),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from_write(err, "A user with this username or email already exists"))?;

    Ok(user.into())
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<User>> {
    let role = payload.role.unwrap_or(Role::Client);
    let user = insert_account(
        state,
        NewAccount {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role,
            is_active: true,
            is_approved: role.auto_approved_on_signup(),
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = ?user.role, approved = user.is_approved, "user signed up");
    state.notifier.welcome(&user.email, &user.username);

    let message = if user.is_approved {
        "User created"
    } else {
        "User created, awaiting approval"
    };
    Ok(ApiResponse::success(message, user, Some(Meta::empty())))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;
    let user = Users::find()
        .filter(UserCol::Username.eq(username.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Incorrect username or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::BadRequest("Incorrect username or password".into()));
    }
    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".into()));
    }

    let token = issue_token(
        user.id,
        &state.config.jwt_secret,
        state.config.token_ttl_minutes,
    )?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            token_type: "bearer".into(),
        },
        Some(Meta::empty()),
    ))
}
