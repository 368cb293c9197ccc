//! One-shot CSV fixture loader.
//!
//! Files are read in dependency order and rows are inserted with their own
//! ids, skipping request validation. There is no surrounding transaction: the
//! first failing row aborts the run and leaves earlier rows in place.

use std::path::Path;

use anyhow::Context;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    entities::{category, comment, genre, review, title, title_genre, user},
    models::Role,
    store::now_sec,
};

#[derive(Debug, Deserialize)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Debug, Deserialize)]
struct SlugRow {
    id: i32,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    id: i32,
    name: String,
    year: i32,
    category: Option<i32>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct GenreTitleRow {
    id: i32,
    title_id: i32,
    genre_id: i32,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    id: i32,
    title_id: i32,
    text: String,
    author: i32,
    score: i32,
    pub_date: String,
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    id: i32,
    review_id: i32,
    text: String,
    author: i32,
    pub_date: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub users: usize,
    pub categories: usize,
    pub genres: usize,
    pub titles: usize,
    pub genre_links: usize,
    pub reviews: usize,
    pub comments: usize,
}

pub async fn import_dir(db: &DatabaseConnection, dir: &Path) -> anyhow::Result<ImportReport> {
    let mut report = ImportReport::default();

    for row in read_rows::<UserRow>(&dir.join("users.csv"))? {
        let role = if row.role.is_empty() { Role::User.as_code().to_string() } else { row.role };
        user::Entity::insert(user::ActiveModel {
            id: Set(row.id),
            username: Set(row.username),
            email: Set(row.email),
            first_name: Set(row.first_name),
            last_name: Set(row.last_name),
            bio: Set(row.bio),
            role: Set(role),
            is_superuser: Set(false),
            confirmation_code: Set(String::new()),
            date_joined: Set(now_sec()),
        })
        .exec(db)
        .await
        .with_context(|| format!("users.csv row id={}", row.id))?;
        report.users += 1;
    }
    tracing::info!(rows = report.users, "users imported");

    for row in read_rows::<SlugRow>(&dir.join("category.csv"))? {
        category::Entity::insert(category::ActiveModel {
            id: Set(row.id),
            name: Set(row.name),
            slug: Set(row.slug),
        })
        .exec(db)
        .await
        .with_context(|| format!("category.csv row id={}", row.id))?;
        report.categories += 1;
    }
    tracing::info!(rows = report.categories, "categories imported");

    for row in read_rows::<SlugRow>(&dir.join("genre.csv"))? {
        genre::Entity::insert(genre::ActiveModel {
            id: Set(row.id),
            name: Set(row.name),
            slug: Set(row.slug),
        })
        .exec(db)
        .await
        .with_context(|| format!("genre.csv row id={}", row.id))?;
        report.genres += 1;
    }
    tracing::info!(rows = report.genres, "genres imported");

    for row in read_rows::<TitleRow>(&dir.join("titles.csv"))? {
        title::Entity::insert(title::ActiveModel {
            id: Set(row.id),
            name: Set(row.name),
            year: Set(row.year),
            description: Set(row.description),
            category_id: Set(row.category),
        })
        .exec(db)
        .await
        .with_context(|| format!("titles.csv row id={}", row.id))?;
        report.titles += 1;
    }
    tracing::info!(rows = report.titles, "titles imported");

    let links = dir.join("genre_title.csv");
    if links.exists() {
        for row in read_rows::<GenreTitleRow>(&links)? {
            title_genre::Entity::insert(title_genre::ActiveModel {
                id: Set(row.id),
                title_id: Set(row.title_id),
                genre_id: Set(row.genre_id),
            })
            .exec(db)
            .await
            .with_context(|| format!("genre_title.csv row id={}", row.id))?;
            report.genre_links += 1;
        }
        tracing::info!(rows = report.genre_links, "title genres imported");
    }

    for row in read_rows::<ReviewRow>(&dir.join("review.csv"))? {
        review::Entity::insert(review::ActiveModel {
            id: Set(row.id),
            title_id: Set(row.title_id),
            author_id: Set(row.author),
            text: Set(row.text),
            score: Set(row.score),
            pub_date: Set(parse_pub_date(&row.pub_date)?),
        })
        .exec(db)
        .await
        .with_context(|| format!("review.csv row id={}", row.id))?;
        report.reviews += 1;
    }
    tracing::info!(rows = report.reviews, "reviews imported");

    for row in read_rows::<CommentRow>(&dir.join("comments.csv"))? {
        comment::Entity::insert(comment::ActiveModel {
            id: Set(row.id),
            review_id: Set(row.review_id),
            author_id: Set(row.author),
            text: Set(row.text),
            pub_date: Set(parse_pub_date(&row.pub_date)?),
        })
        .exec(db)
        .await
        .with_context(|| format!("comments.csv row id={}", row.id))?;
        report.comments += 1;
    }
    tracing::info!(rows = report.comments, "comments imported");

    Ok(report)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .with_context(|| format!("parsing {}", path.display()))
}

fn parse_pub_date(raw: &str) -> anyhow::Result<i64> {
    let ts: jiff::Timestamp = raw.parse().with_context(|| format!("pub_date {raw:?}"))?;
    Ok(ts.as_second())
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{db, models::TitleFilter, pagination::Window, store::Store};

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn fixtures(dir: &Path) {
        write(dir, "users.csv", "id,username,email,role,bio,first_name,last_name\n\
            100,bingobongo,bingobongo@yamdb.fake,user,,,\n\
            101,capt_obvious,capt_obvious@yamdb.fake,admin,,,\n");
        write(dir, "category.csv", "id,name,slug\n1,Фильм,movie\n2,Книга,book\n");
        write(dir, "genre.csv", "id,name,slug\n1,Драма,drama\n2,Комедия,comedy\n");
        write(
            dir,
            "titles.csv",
            "id,name,year,category\n1,Побег из Шоушенка,1994,1\n2,Крёстный отец,1972,1\n",
        );
        write(dir, "genre_title.csv", "id,title_id,genre_id\n1,1,1\n2,2,1\n3,2,2\n");
        write(dir, "review.csv", "id,title_id,text,author,score,pub_date\n\
            1,1,Ставлю десять,100,10,2019-09-24T21:08:21.567Z\n\
            2,1,Не впечатлило,101,7,2019-09-25T21:08:21.567Z\n");
        write(dir, "comments.csv", "id,review_id,text,author,pub_date\n\
            1,1,Согласен,101,2019-09-26T21:08:21.567Z\n");
    }

    #[tokio::test]
    async fn imports_all_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fixtures(dir.path());
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("db.sqlite3").display());
        let conn = db::connect_and_migrate(&url).await.unwrap();

        let report = import_dir(&conn, dir.path()).await.unwrap();
        assert_eq!(
            report,
            ImportReport {
                users: 2,
                categories: 2,
                genres: 2,
                titles: 2,
                genre_links: 3,
                reviews: 2,
                comments: 1,
            }
        );

        let store = Store::new(conn.clone());
        let window = Window { limit: 10, offset: 0 };
        let (titles, count) = store.list_titles(&TitleFilter::default(), window).await.unwrap();
        assert_eq!(count, 2);
        let shawshank = titles.iter().find(|t| t.id == 1).unwrap();
        assert_eq!(shawshank.rating, Some(8.5));
        let godfather = titles.iter().find(|t| t.id == 2).unwrap();
        assert_eq!(godfather.rating, None);
        assert_eq!(godfather.genre.len(), 2);
        assert_eq!(comment::Entity::find().count(&conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn bad_row_aborts_and_keeps_earlier_files() {
        let dir = tempfile::tempdir().unwrap();
        fixtures(dir.path());
        write(dir.path(), "titles.csv", "id,name,year,category\n1,Broken,not-a-year,1\n");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("db.sqlite3").display());
        let conn = db::connect_and_migrate(&url).await.unwrap();

        assert!(import_dir(&conn, dir.path()).await.is_err());
        assert_eq!(user::Entity::find().count(&conn).await.unwrap(), 2);
        assert_eq!(title::Entity::find().count(&conn).await.unwrap(), 0);
    }
}
