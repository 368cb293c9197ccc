use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set, SqlErr,
};

use super::{Store, contains, now_sec};
use crate::{
    entities::user,
    error::{AppError, AppResult},
    models::{CreateUserRequest, Role, SignupRequest, UpdateUserRequest},
    pagination::Window,
    validation::FieldErrors,
};

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

#[derive(Debug)]
pub enum SignupOutcome {
    Created(user::Model),
    Existing(user::Model),
}

impl SignupOutcome {
    pub fn into_user(self) -> user::Model {
        match self {
            SignupOutcome::Created(u) | SignupOutcome::Existing(u) => u,
        }
    }
}

impl Store {
    pub async fn find_user_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find().filter(user::Column::Username.eq(username)).one(&self.db).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find().filter(user::Column::Email.eq(email)).one(&self.db).await?)
    }

    pub async fn list_users(
        &self,
        search: Option<&str>,
        window: Window,
    ) -> AppResult<(Vec<user::Model>, u64)> {
        let mut query = user::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(contains((user::Entity, user::Column::Username), term));
        }
        let count = query.clone().count(&self.db).await?;
        let users = query
            .order_by_asc(user::Column::Username)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await?;
        Ok((users, count))
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> AppResult<user::Model> {
        self.ensure_unique(None, Some(&req.username), Some(&req.email)).await?;

        let model = user::ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            bio: Set(req.bio),
            role: Set(req.role.as_code().to_string()),
            is_superuser: Set(false),
            confirmation_code: Set(String::new()),
            date_joined: Set(now_sec()),
            ..Default::default()
        };
        model.insert(&self.db).await.map_err(user_clash)
    }

    /// Applies a partial update. `allow_role` is false on the self-service path,
    /// where a submitted role is ignored.
    pub async fn update_user(
        &self,
        current: user::Model,
        req: UpdateUserRequest,
        allow_role: bool,
    ) -> AppResult<user::Model> {
        let new_username = req.username.as_deref().filter(|u| *u != current.username);
        let new_email = req.email.as_deref().filter(|e| *e != current.email);
        self.ensure_unique(Some(current.id), new_username, new_email).await?;

        let old_role = current.role();
        let id = current.id;
        let mut model = current.clone().into_active_model();
        if let Some(username) = req.username {
            model.username = Set(username);
        }
        if let Some(email) = req.email {
            model.email = Set(email);
        }
        if let Some(first_name) = req.first_name {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = req.last_name {
            model.last_name = Set(last_name);
        }
        if let Some(bio) = req.bio {
            model.bio = Set(bio);
        }
        match req.role {
            Some(role) if allow_role => {
                if role != old_role {
                    tracing::info!(
                        user_id = id,
                        from = old_role.as_code(),
                        to = role.as_code(),
                        "role changed"
                    );
                }
                model.role = Set(role.as_code().to_string());
            },
            Some(_) => tracing::debug!(user_id = id, "ignoring role in self-service update"),
            None => {},
        }

        if !model.is_changed() {
            return Ok(current);
        }
        model.update(&self.db).await.map_err(user_clash)
    }

    pub async fn delete_user(&self, username: &str) -> AppResult<bool> {
        let res = user::Entity::delete_many()
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Creates the account, or returns the existing one when the exact
    /// (username, email) pair is already registered.
    pub async fn signup_user(&self, req: &SignupRequest) -> AppResult<SignupOutcome> {
        let by_name = self.find_user_by_username(&req.username).await?;
        let by_email = self.find_user_by_email(&req.email).await?;

        match (by_name, by_email) {
            (Some(a), Some(b)) if a.id == b.id => return Ok(SignupOutcome::Existing(a)),
            (None, None) => {},
            (by_name, by_email) => {
                let mut errors = FieldErrors::new();
                if by_name.is_some() {
                    errors.insert("username".into(), vec![USERNAME_TAKEN.into()]);
                }
                if by_email.is_some() {
                    errors.insert("email".into(), vec![EMAIL_TAKEN.into()]);
                }
                return Err(AppError::Validation(errors));
            },
        }

        let model = user::ActiveModel {
            username: Set(req.username.clone()),
            email: Set(req.email.clone()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            bio: Set(String::new()),
            role: Set(Role::User.as_code().to_string()),
            is_superuser: Set(false),
            confirmation_code: Set(String::new()),
            date_joined: Set(now_sec()),
            ..Default::default()
        };
        let user = model.insert(&self.db).await.map_err(user_clash)?;
        Ok(SignupOutcome::Created(user))
    }

    pub async fn set_confirmation_code(
        &self,
        user: user::Model,
        code: &str,
    ) -> AppResult<user::Model> {
        let mut model = user.into_active_model();
        model.confirmation_code = Set(code.to_string());
        Ok(model.update(&self.db).await?)
    }

    /// Creates an admin superuser, or promotes the matching existing account.
    pub async fn upsert_superuser(&self, username: &str, email: &str) -> AppResult<user::Model> {
        let existing = self.find_user_by_username(username).await?;
        let model = match existing {
            Some(user) => {
                if user.email != email {
                    return Err(AppError::field("email", "Email does not match the existing user."));
                }
                let mut model = user.into_active_model();
                model.role = Set(Role::Admin.as_code().to_string());
                model.is_superuser = Set(true);
                model.update(&self.db).await?
            },
            None => {
                self.ensure_unique(None, Some(username), Some(email)).await?;
                user::ActiveModel {
                    username: Set(username.to_string()),
                    email: Set(email.to_string()),
                    first_name: Set(String::new()),
                    last_name: Set(String::new()),
                    bio: Set(String::new()),
                    role: Set(Role::Admin.as_code().to_string()),
                    is_superuser: Set(true),
                    confirmation_code: Set(String::new()),
                    date_joined: Set(now_sec()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await
                .map_err(user_clash)?
            },
        };
        Ok(model)
    }

    async fn ensure_unique(
        &self,
        except_id: Option<i32>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(username) = username {
            let clash = user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .apply_if(except_id, |q, id| q.filter(user::Column::Id.ne(id)))
                .count(&self.db)
                .await?;
            if clash > 0 {
                errors.insert("username".into(), vec![USERNAME_TAKEN.into()]);
            }
        }
        if let Some(email) = email {
            let clash = user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .apply_if(except_id, |q, id| q.filter(user::Column::Id.ne(id)))
                .count(&self.db)
                .await?;
            if clash > 0 {
                errors.insert("email".into(), vec![EMAIL_TAKEN.into()]);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
    }
}

/// A unique violation that slipped past `ensure_unique` (a concurrent insert),
/// reported against the column SQLite names in the message.
fn user_clash(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            let field = clashing_field(&message);
            let text = if field == "email" { EMAIL_TAKEN } else { USERNAME_TAKEN };
            AppError::field(field, text)
        },
        _ => AppError::Database(err),
    }
}

fn clashing_field(message: &str) -> &'static str {
    // e.g. "UNIQUE constraint failed: users.email"
    if message.contains(".email") && !message.contains(".username") { "email" } else { "username" }
}
