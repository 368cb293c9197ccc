use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{
    entities::{category, genre, user},
    validation::{SLUG_RE, USERNAME_RE, validate_not_reserved, validate_year},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_code(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

// Category and genre share one wire shape.

#[derive(Clone, Debug, Serialize)]
pub struct SlugEntry {
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for SlugEntry {
    fn from(m: category::Model) -> Self {
        Self { name: m.name, slug: m.slug }
    }
}

impl From<genre::Model> for SlugEntry {
    fn from(m: genre::Model) -> Self {
        Self { name: m.name, slug: m.slug }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlugEntryRequest {
    #[validate(length(min = 1, max = 256, message = "Ensure this field has 1 to 256 characters."))]
    pub name: String,
    #[validate(
        length(min = 1, max = 50, message = "Ensure this field has 1 to 50 characters."),
        regex(
            path = *SLUG_RE,
            message = "Enter a valid slug consisting of letters, numbers, underscores or hyphens."
        )
    )]
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// Titles

#[derive(Clone, Debug, Serialize)]
pub struct TitleView {
    pub id: i32,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: String,
    pub genre: Vec<SlugEntry>,
    pub category: Option<SlugEntry>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = 256, message = "Ensure this field has 1 to 256 characters."))]
    pub name: String,
    #[validate(
        range(min = 0, message = "Ensure this value is greater than or equal to 0."),
        custom(function = "validate_year")
    )]
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "This list may not be empty."))]
    pub genre: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = 256, message = "Ensure this field has 1 to 256 characters."))]
    pub name: Option<String>,
    #[validate(
        range(min = 0, message = "Ensure this value is greater than or equal to 0."),
        custom(function = "validate_year")
    )]
    pub year: Option<i32>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "This list may not be empty."))]
    pub genre: Option<Vec<String>>,
    /// `Some(None)` is an explicit `null` and detaches the category.
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
}

/// Keeps an explicit `null` apart from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleFilter {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub genre: Option<String>,
}

// Reviews and comments

#[derive(Clone, Debug, Serialize)]
pub struct ReviewView {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub score: i32,
    pub pub_date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: i32,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
    #[validate(range(min = 1, max = 10, message = "Score must be between 1 and 10."))]
    pub score: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub author: String,
    pub pub_date: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
}

// Users

#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<user::Model> for UserView {
    fn from(m: user::Model) -> Self {
        let role = m.role();
        Self {
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            bio: m.bio,
            role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has 1 to 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. Letters, digits and @/./+/-/_ only."
        ),
        custom(function = "validate_not_reserved")
    )]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has 1 to 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. Letters, digits and @/./+/-/_ only."
        ),
        custom(function = "validate_not_reserved")
    )]
    pub username: Option<String>,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

// Auth

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has 1 to 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. Letters, digits and @/./+/-/_ only."
        ),
        custom(function = "validate_not_reserved")
    )]
    pub username: String,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has 1 to 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. Letters, digits and @/./+/-/_ only."
        )
    )]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "This field may not be blank."))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
