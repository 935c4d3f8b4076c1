//! Role capability table.
//!
//! Every guarded operation is looked up as `operation x role`. A role either
//! has no access, access to any entity, or access limited to entities it owns
//! (products it produces, field records it collected, orders it placed or was
//! assigned to deliver).

use uuid::Uuid;

use crate::{
    entity::users::Role,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    UploadProductImage,
    CreateFieldData,
    ListFieldData,
    ListUsers,
    CreateUser,
    ApproveUser,
    UpdateUser,
    DeleteUser,
    ListOrders,
    ListPendingOrders,
    ListDeliveryPersons,
    AssignOrder,
    UpdateOrderStatus,
    ViewForecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Denied,
    Any,
    Own,
}

pub fn access(operation: Operation, role: Role) -> Access {
    use Operation as Op;

    match (operation, role) {
        (Op::CreateProduct | Op::UpdateProduct | Op::DeleteProduct, Role::Admin) => Access::Any,
        (Op::CreateProduct | Op::UpdateProduct | Op::DeleteProduct, Role::Producer) => {
            Access::Own
        }
        (Op::UploadProductImage, Role::Admin | Role::Manager | Role::Producer) => Access::Any,

        (Op::CreateFieldData | Op::ListFieldData, Role::Admin) => Access::Any,
        (Op::CreateFieldData | Op::ListFieldData, Role::FieldAgent) => Access::Own,

        (
            Op::ListUsers | Op::CreateUser | Op::ApproveUser | Op::UpdateUser | Op::DeleteUser,
            Role::Admin | Role::Manager,
        ) => Access::Any,

        (Op::ListOrders, Role::Admin | Role::Manager) => Access::Any,
        (Op::ListOrders, Role::Client | Role::DeliveryPerson) => Access::Own,
        (
            Op::ListPendingOrders | Op::ListDeliveryPersons | Op::AssignOrder | Op::ViewForecast,
            Role::Admin | Role::Manager,
        ) => Access::Any,
        (Op::UpdateOrderStatus, Role::Admin | Role::Manager) => Access::Any,
        (Op::UpdateOrderStatus, Role::DeliveryPerson) => Access::Own,

        _ => Access::Denied,
    }
}

/// Role gate only. Returns the granted scope so callers can narrow queries.
pub fn authorize(user: &AuthUser, operation: Operation) -> AppResult<Access> {
    match access(operation, user.role) {
        Access::Denied => {
            tracing::debug!(user_id = %user.user_id, role = ?user.role, ?operation, "permission denied");
            Err(AppError::Forbidden(denial_message(operation).into()))
        }
        granted => Ok(granted),
    }
}

/// Role gate plus ownership: `Own` access passes only when `owner` is the
/// caller.
pub fn authorize_owner(user: &AuthUser, operation: Operation, owner: Option<Uuid>) -> AppResult<()> {
    match authorize(user, operation)? {
        Access::Any => Ok(()),
        Access::Own if owner == Some(user.user_id) => Ok(()),
        _ => Err(AppError::Forbidden(ownership_message(operation).into())),
    }
}

fn denial_message(operation: Operation) -> &'static str {
    match operation {
        Operation::CreateProduct | Operation::UpdateProduct | Operation::DeleteProduct => {
            "Only producers and administrators can manage products"
        }
        Operation::UploadProductImage => {
            "Only administrators, managers and producers can upload product images"
        }
        Operation::CreateFieldData | Operation::ListFieldData => {
            "Only field agents and administrators can access field data"
        }
        Operation::ListUsers
        | Operation::CreateUser
        | Operation::ApproveUser
        | Operation::UpdateUser
        | Operation::DeleteUser => "Only administrators and managers can manage users",
        Operation::ListOrders => "Your role cannot list orders",
        Operation::ViewForecast => "Access denied",
        _ => "Insufficient permissions",
    }
}

fn ownership_message(operation: Operation) -> &'static str {
    match operation {
        Operation::UpdateOrderStatus => "You can only update orders assigned to you",
        Operation::UpdateProduct | Operation::DeleteProduct => {
            "You can only modify your own products"
        }
        _ => "Insufficient permissions",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 6] = [
        Role::Admin,
        Role::Manager,
        Role::Producer,
        Role::FieldAgent,
        Role::DeliveryPerson,
        Role::Client,
    ];

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    fn allowed(operation: Operation) -> Vec<Role> {
        ALL_ROLES
            .into_iter()
            .filter(|role| access(operation, *role) != Access::Denied)
            .collect()
    }

    #[test]
    fn product_matrix() {
        assert_eq!(
            allowed(Operation::CreateProduct),
            vec![Role::Admin, Role::Producer]
        );
        assert_eq!(
            allowed(Operation::DeleteProduct),
            vec![Role::Admin, Role::Producer]
        );
        assert_eq!(
            allowed(Operation::UploadProductImage),
            vec![Role::Admin, Role::Manager, Role::Producer]
        );
        assert_eq!(access(Operation::UpdateProduct, Role::Producer), Access::Own);
    }

    #[test]
    fn user_and_order_management_is_staff_only() {
        for op in [
            Operation::CreateUser,
            Operation::ApproveUser,
            Operation::DeleteUser,
            Operation::AssignOrder,
            Operation::ListPendingOrders,
        ] {
            assert_eq!(allowed(op), vec![Role::Admin, Role::Manager], "{op:?}");
        }
    }

    #[test]
    fn order_listing_scopes() {
        assert_eq!(access(Operation::ListOrders, Role::Admin), Access::Any);
        assert_eq!(access(Operation::ListOrders, Role::Client), Access::Own);
        assert_eq!(
            access(Operation::ListOrders, Role::DeliveryPerson),
            Access::Own
        );
        assert_eq!(access(Operation::ListOrders, Role::Producer), Access::Denied);
        assert_eq!(
            access(Operation::ListOrders, Role::FieldAgent),
            Access::Denied
        );
    }

    #[test]
    fn field_data_matrix() {
        assert_eq!(
            allowed(Operation::ListFieldData),
            vec![Role::Admin, Role::FieldAgent]
        );
        assert_eq!(
            access(Operation::ListFieldData, Role::FieldAgent),
            Access::Own
        );
    }

    #[test]
    fn delivery_person_needs_assignment() {
        let driver = user(Role::DeliveryPerson);
        assert!(
            authorize_owner(&driver, Operation::UpdateOrderStatus, Some(driver.user_id)).is_ok()
        );
        assert!(matches!(
            authorize_owner(&driver, Operation::UpdateOrderStatus, Some(Uuid::new_v4())),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_owner(&driver, Operation::UpdateOrderStatus, None),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_acts_on_anything_client_on_nothing() {
        let admin = user(Role::Admin);
        assert!(authorize_owner(&admin, Operation::UpdateProduct, None).is_ok());

        let client = user(Role::Client);
        assert!(matches!(
            authorize(&client, Operation::CreateProduct),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_owner(&client, Operation::UpdateOrderStatus, Some(client.user_id)),
            Err(AppError::Forbidden(_))
        ));
    }
}
