use sea_orm::entity::prelude::*;

use crate::models::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: String,
    pub is_superuser: bool,
    pub confirmation_code: String,
    pub date_joined: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unknown role strings (e.g. from a hand-edited import) fall back to `user`.
    pub fn role(&self) -> Role {
        Role::from_code(&self.role).unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin || self.is_superuser
    }

    pub fn is_moderator(&self) -> bool {
        self.role() == Role::Moderator
    }
}
