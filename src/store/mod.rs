//! Database access. `Store` wraps the connection the way handlers see it:
//! every method takes or returns plain entity models or wire views.

mod catalog;
mod reviews;
mod users;

use sea_orm::{
    DatabaseConnection,
    sea_query::{Expr, IntoColumnRef, LikeExpr, SimpleExpr},
};

pub use users::SignupOutcome;

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// `column LIKE '%term%'` with the term's own `%`, `_` and `\` matched literally.
/// SQLite LIKE is case-insensitive for ASCII.
pub(crate) fn contains(column: impl IntoColumnRef, term: &str) -> SimpleExpr {
    Expr::col(column).like(LikeExpr::new(format!("%{}%", escape_like(term))).escape('\\'))
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

/// Renders a stored unix timestamp as RFC 3339 UTC.
pub(crate) fn render_timestamp(seconds: i64) -> String {
    jiff::Timestamp::from_second(seconds).map(|ts| ts.to_string()).unwrap_or_default()
}
