use crate::{
    entities::user,
    error::{AppError, AppResult},
};

/// Catalog writes and user administration.
pub fn require_admin(user: &user::Model) -> AppResult<()> {
    if user.is_admin() { Ok(()) } else { Err(AppError::Forbidden) }
}

/// Reviews and comments can be changed by their author, moderators and admins.
pub fn can_modify_content(user: &user::Model, author_id: i32) -> bool {
    user.id == author_id || user.is_moderator() || user.is_admin()
}

pub fn require_content_access(user: &user::Model, author_id: i32) -> AppResult<()> {
    if can_modify_content(user, author_id) { Ok(()) } else { Err(AppError::Forbidden) }
}
