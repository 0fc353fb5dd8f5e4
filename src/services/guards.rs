use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::entities::user;
use crate::error::{AppError, AppResult};

pub async fn find_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub fn ensure_can_drive(user: &user::Model) -> AppResult<()> {
    if user.role.can_drive() {
        Ok(())
    } else {
        Err(AppError::ForbiddenRole(
            "Access forbidden: Your role does not permit offering rides.".to_string(),
        ))
    }
}

pub fn ensure_can_ride(user: &user::Model) -> AppResult<()> {
    if user.role.can_ride() {
        Ok(())
    } else {
        Err(AppError::ForbiddenRole(
            "Access forbidden: Your role does not permit booking rides.".to_string(),
        ))
    }
}

pub fn ensure_seat_count(total_seats: i32) -> AppResult<()> {
    if total_seats < 1 {
        return Err(AppError::Validation(
            "total_seats must be at least 1".to_string(),
        ));
    }
    Ok(())
}
