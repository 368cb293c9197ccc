use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};

use super::{Store, contains};
use crate::{
    entities::{category, genre, review, title, title_genre},
    error::{AppError, AppResult},
    models::{
        CreateTitleRequest, SlugEntry, SlugEntryRequest, TitleFilter, TitleView, UpdateTitleRequest,
    },
    pagination::Window,
};

const SLUG_TAKEN: &str = "An entry with this slug already exists.";

impl Store {
    pub async fn list_categories(
        &self,
        search: Option<&str>,
        window: Window,
    ) -> AppResult<(Vec<SlugEntry>, u64)> {
        let mut query = category::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(contains((category::Entity, category::Column::Name), term));
        }
        let count = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await?;
        Ok((rows.into_iter().map(SlugEntry::from).collect(), count))
    }

    pub async fn create_category(&self, req: SlugEntryRequest) -> AppResult<SlugEntry> {
        let taken = category::Entity::find()
            .filter(category::Column::Slug.eq(&req.slug))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::field("slug", SLUG_TAKEN));
        }
        let model = category::ActiveModel {
            name: Set(req.name),
            slug: Set(req.slug),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_unique(e, "slug", SLUG_TAKEN))?;
        Ok(model.into())
    }

    pub async fn delete_category(&self, slug: &str) -> AppResult<bool> {
        let res = category::Entity::delete_many()
            .filter(category::Column::Slug.eq(slug))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn list_genres(
        &self,
        search: Option<&str>,
        window: Window,
    ) -> AppResult<(Vec<SlugEntry>, u64)> {
        let mut query = genre::Entity::find();
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query = query.filter(contains((genre::Entity, genre::Column::Name), term));
        }
        let count = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(genre::Column::Name)
            .order_by_asc(genre::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await?;
        Ok((rows.into_iter().map(SlugEntry::from).collect(), count))
    }

    pub async fn create_genre(&self, req: SlugEntryRequest) -> AppResult<SlugEntry> {
        let taken =
            genre::Entity::find().filter(genre::Column::Slug.eq(&req.slug)).count(&self.db).await?;
        if taken > 0 {
            return Err(AppError::field("slug", SLUG_TAKEN));
        }
        let model = genre::ActiveModel {
            name: Set(req.name),
            slug: Set(req.slug),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_unique(e, "slug", SLUG_TAKEN))?;
        Ok(model.into())
    }

    pub async fn delete_genre(&self, slug: &str) -> AppResult<bool> {
        let res =
            genre::Entity::delete_many().filter(genre::Column::Slug.eq(slug)).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn find_title(&self, id: i32) -> AppResult<Option<title::Model>> {
        Ok(title::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn list_titles(
        &self,
        filter: &TitleFilter,
        window: Window,
    ) -> AppResult<(Vec<TitleView>, u64)> {
        let mut query = title::Entity::find();

        if let Some(name) = filter.name.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(contains((title::Entity, title::Column::Name), name));
        }
        if let Some(year) = filter.year {
            query = query.filter(title::Column::Year.eq(year));
        }
        if let Some(slug) = filter.category.as_deref() {
            query = query.filter(
                title::Column::CategoryId.in_subquery(
                    Query::select()
                        .column(category::Column::Id)
                        .from(category::Entity)
                        .and_where(category::Column::Slug.eq(slug))
                        .to_owned(),
                ),
            );
        }
        if let Some(slug) = filter.genre.as_deref() {
            query = query.filter(
                title::Column::Id.in_subquery(
                    Query::select()
                        .column(title_genre::Column::TitleId)
                        .from(title_genre::Entity)
                        .and_where(
                            title_genre::Column::GenreId.in_subquery(
                                Query::select()
                                    .column(genre::Column::Id)
                                    .from(genre::Entity)
                                    .and_where(genre::Column::Slug.eq(slug))
                                    .to_owned(),
                            ),
                        )
                        .to_owned(),
                ),
            );
        }

        let count = query.clone().count(&self.db).await?;
        let titles = query
            .order_by_asc(title::Column::Name)
            .order_by_asc(title::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .all(&self.db)
            .await?;

        Ok((self.title_views(titles).await?, count))
    }

    pub async fn title_view(&self, model: title::Model) -> AppResult<TitleView> {
        let mut views = self.title_views(vec![model]).await?;
        views.pop().ok_or_else(|| anyhow::anyhow!("title view lost").into())
    }

    /// Builds read views in three batched queries: genres, categories, ratings.
    async fn title_views(&self, titles: Vec<title::Model>) -> AppResult<Vec<TitleView>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = titles.iter().map(|t| t.id).collect();

        let mut genres: HashMap<i32, Vec<SlugEntry>> = HashMap::new();
        let links = title_genre::Entity::find()
            .filter(title_genre::Column::TitleId.is_in(ids.clone()))
            .find_also_related(genre::Entity)
            .order_by_asc(genre::Column::Name)
            .all(&self.db)
            .await?;
        for (link, g) in links {
            if let Some(g) = g {
                genres.entry(link.title_id).or_default().push(g.into());
            }
        }

        let category_ids: BTreeSet<i32> = titles.iter().filter_map(|t| t.category_id).collect();
        let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        let ratings: HashMap<i32, f64> = review::Entity::find()
            .select_only()
            .column(review::Column::TitleId)
            .column_as(Expr::cust("AVG(CAST(score AS REAL))"), "rating")
            .filter(review::Column::TitleId.is_in(ids))
            .group_by(review::Column::TitleId)
            .into_tuple::<(i32, f64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        Ok(titles
            .into_iter()
            .map(|t| TitleView {
                rating: ratings.get(&t.id).copied(),
                genre: genres.remove(&t.id).unwrap_or_default(),
                category: t.category_id.and_then(|id| categories.get(&id)).cloned().map(Into::into),
                id: t.id,
                name: t.name,
                year: t.year,
                description: t.description,
            })
            .collect())
    }

    pub async fn create_title(&self, req: CreateTitleRequest) -> AppResult<TitleView> {
        let category_id = match req.category.as_deref() {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = self.resolve_genres(&req.genre).await?;

        let txn = self.db.begin().await?;
        let model = title::ActiveModel {
            name: Set(req.name),
            year: Set(req.year),
            description: Set(req.description),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        replace_genres(&txn, model.id, &genre_ids).await?;
        txn.commit().await?;

        tracing::info!(title_id = model.id, name = %model.name, "title created");
        self.title_view(model).await
    }

    pub async fn update_title(
        &self,
        current: title::Model,
        req: UpdateTitleRequest,
    ) -> AppResult<TitleView> {
        // Outer `None` leaves the category alone, `Some(None)` detaches it.
        let category_id = match req.category.as_ref() {
            Some(Some(slug)) => Some(Some(self.resolve_category(slug).await?)),
            Some(None) => Some(None),
            None => None,
        };
        let genre_ids = match req.genre.as_deref() {
            Some(slugs) => Some(self.resolve_genres(slugs).await?),
            None => None,
        };

        let id = current.id;
        let mut model = current.clone().into_active_model();
        if let Some(name) = req.name {
            model.name = Set(name);
        }
        if let Some(year) = req.year {
            model.year = Set(year);
        }
        if let Some(description) = req.description {
            model.description = Set(description);
        }
        if let Some(category_id) = category_id {
            model.category_id = Set(category_id);
        }

        let txn = self.db.begin().await?;
        let model = if model.is_changed() { model.update(&txn).await? } else { current };
        if let Some(genre_ids) = genre_ids {
            replace_genres(&txn, id, &genre_ids).await?;
        }
        txn.commit().await?;

        self.title_view(model).await
    }

    pub async fn delete_title(&self, id: i32) -> AppResult<bool> {
        let res = title::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn resolve_category(&self, slug: &str) -> AppResult<i32> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| AppError::field("category", missing_slug(slug)))
    }

    async fn resolve_genres(&self, slugs: &[String]) -> AppResult<Vec<i32>> {
        let wanted: BTreeSet<&str> = slugs.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        let found = genre::Entity::find()
            .filter(genre::Column::Slug.is_in(wanted.iter().copied()))
            .all(&self.db)
            .await?;
        let missing: Vec<String> = wanted
            .iter()
            .filter(|slug| !found.iter().any(|g| g.slug == **slug))
            .map(|slug| missing_slug(slug))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation([("genre".to_string(), missing)].into()));
        }
        Ok(found.into_iter().map(|g| g.id).collect())
    }
}

async fn replace_genres<C: ConnectionTrait>(
    conn: &C,
    title_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .exec(conn)
        .await?;
    if genre_ids.is_empty() {
        return Ok(());
    }
    let links = genre_ids.iter().map(|genre_id| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(*genre_id),
        ..Default::default()
    });
    title_genre::Entity::insert_many(links).exec(conn).await?;
    Ok(())
}

fn missing_slug(slug: &str) -> String {
    format!("Object with slug={slug} does not exist.")
}
