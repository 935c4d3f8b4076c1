use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    authz::{Operation, authorize},
    dto::users::{
        CreateUserRequest, DeliveryPerson, DeliveryPersonList, UpdateUserRequest, UserList,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Role},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    security::hash_password,
    services::auth_service::{NewAccount, insert_account},
    state::AppState,
};

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::success("Current user", model.into(), None))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    authorize(user, Operation::ListUsers)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_asc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::paged(
        "Users",
        UserList { items },
        Meta::new(page, limit, total),
    ))
}

/// Staff-created accounts skip the approval queue.
pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    authorize(user, Operation::CreateUser)?;

    let created = insert_account(
        state,
        NewAccount {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            role: payload.role,
            is_active: payload.is_active.unwrap_or(true),
            is_approved: true,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        },
    )
    .await?;

    tracing::info!(actor = %user.user_id, user_id = %created.id, role = ?created.role, "user created");
    state.notifier.welcome(&created.email, &created.username);

    Ok(ApiResponse::success("User created", created, Some(Meta::empty())))
}

pub async fn approve_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    authorize(user, Operation::ApproveUser)?;

    let mut active: UserActive = existing.into();
    active.is_approved = Set(true);
    let approved = active.update(&state.orm).await?;

    tracing::info!(actor = %user.user_id, user_id = %approved.id, "user approved");
    state.notifier.approved(&approved.email, &approved.username);

    Ok(ApiResponse::success("User approved", approved.into(), Some(Meta::empty())))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    authorize(user, Operation::UpdateUser)?;

    let taken = Condition::any()
        .add_option(payload.username.as_deref().map(|u| UserCol::Username.eq(u.trim())))
        .add_option(
            payload
                .email
                .as_deref()
                .map(|e| UserCol::Email.eq(e.trim().to_lowercase())),
        );
    if payload.username.is_some() || payload.email.is_some() {
        let clash = Users::find()
            .filter(taken)
            .filter(UserCol::Id.ne(id))
            .one(&state.orm)
            .await?;
        if clash.is_some() {
            return Err(AppError::Conflict(
                "A user with this username or email already exists".into(),
            ));
        }
    }

    let mut active: UserActive = existing.into();
    if let Some(username) = payload.username {
        active.username = Set(username.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(email.trim().to_lowercase());
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_approved) = payload.is_approved {
        active.is_approved = Set(is_approved);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(Some(first_name));
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(Some(last_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        active.password_hash = Set(hash_password(&password)?);
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::from_write(err, "A user with this username or email already exists"))?;

    tracing::info!(actor = %user.user_id, user_id = %updated.id, "user updated");
    Ok(ApiResponse::success("User updated", updated.into(), Some(Meta::empty())))
}

/// Nobody deletes themselves, and only an admin may delete another admin.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    authorize(user, Operation::DeleteUser)?;

    if existing.id == user.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".into()));
    }
    if existing.role == Role::Admin && !user.is(Role::Admin) {
        return Err(AppError::Forbidden(
            "Only an admin can delete another admin".into(),
        ));
    }

    let deleted: User = existing.clone().into();
    existing.delete(&state.orm).await.map_err(|err| {
        AppError::from_write(
            err,
            "This user is linked to existing records and cannot be deleted; deactivate the account instead",
        )
    })?;

    tracing::info!(actor = %user.user_id, user_id = %deleted.id, "user deleted");
    Ok(ApiResponse::success("User deleted", deleted, Some(Meta::empty())))
}

/// Approved delivery persons that orders can be assigned to.
pub async fn list_delivery_persons(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DeliveryPersonList>> {
    authorize(user, Operation::ListDeliveryPersons)?;

    let items = Users::find()
        .filter(UserCol::Role.eq(Role::DeliveryPerson))
        .filter(UserCol::IsApproved.eq(true))
        .order_by_asc(UserCol::Username)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| DeliveryPerson {
            id: u.id,
            username: u.username,
            email: u.email,
        })
        .collect();

    Ok(ApiResponse::success(
        "Delivery persons",
        DeliveryPersonList { items },
        Some(Meta::empty()),
    ))
}
