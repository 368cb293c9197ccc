use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::{Store, now_sec, render_timestamp};
use crate::{
    entities::{comment, review, user},
    error::{AppError, AppResult},
    models::{
        CommentRequest, CommentView, CreateReviewRequest, ReviewView, UpdateCommentRequest,
        UpdateReviewRequest,
    },
    pagination::Window,
    validation::NON_FIELD_ERRORS,
};

const DUPLICATE_REVIEW: &str = "You have already reviewed this title.";

fn review_view(model: review::Model, author: Option<user::Model>) -> ReviewView {
    ReviewView {
        id: model.id,
        text: model.text,
        author: author.map(|a| a.username).unwrap_or_default(),
        score: model.score,
        pub_date: render_timestamp(model.pub_date),
    }
}

fn comment_view(model: comment::Model, author: Option<user::Model>) -> CommentView {
    CommentView {
        id: model.id,
        text: model.text,
        author: author.map(|a| a.username).unwrap_or_default(),
        pub_date: render_timestamp(model.pub_date),
    }
}

impl Store {
    pub async fn list_reviews(
        &self,
        title_id: i32,
        window: Window,
    ) -> AppResult<(Vec<ReviewView>, u64)> {
        let query = review::Entity::find().filter(review::Column::TitleId.eq(title_id));
        let count = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(review::Column::PubDate)
            .order_by_desc(review::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok((rows.into_iter().map(|(r, a)| review_view(r, a)).collect(), count))
    }

    pub async fn find_review(
        &self,
        title_id: i32,
        review_id: i32,
    ) -> AppResult<Option<review::Model>> {
        Ok(review::Entity::find_by_id(review_id)
            .filter(review::Column::TitleId.eq(title_id))
            .one(&self.db)
            .await?)
    }

    pub async fn review_view(&self, model: review::Model) -> AppResult<ReviewView> {
        let author = model.find_related(user::Entity).one(&self.db).await?;
        Ok(review_view(model, author))
    }

    /// One review per (title, author); a second attempt is a validation error.
    pub async fn create_review(
        &self,
        title_id: i32,
        author: &user::Model,
        req: CreateReviewRequest,
    ) -> AppResult<ReviewView> {
        let existing = review::Entity::find()
            .filter(review::Column::TitleId.eq(title_id))
            .filter(review::Column::AuthorId.eq(author.id))
            .count(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::field(NON_FIELD_ERRORS, DUPLICATE_REVIEW));
        }

        let model = review::ActiveModel {
            title_id: Set(title_id),
            author_id: Set(author.id),
            text: Set(req.text),
            score: Set(req.score),
            pub_date: Set(now_sec()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_unique(e, NON_FIELD_ERRORS, DUPLICATE_REVIEW))?;

        tracing::debug!(
            review_id = model.id,
            title_id,
            author = %author.username,
            "review created"
        );
        Ok(review_view(model, Some(author.clone())))
    }

    pub async fn update_review(
        &self,
        current: review::Model,
        req: UpdateReviewRequest,
    ) -> AppResult<ReviewView> {
        let mut model = current.clone().into_active_model();
        if let Some(text) = req.text {
            model.text = Set(text);
        }
        if let Some(score) = req.score {
            model.score = Set(score);
        }
        let model = if model.is_changed() { model.update(&self.db).await? } else { current };
        self.review_view(model).await
    }

    pub async fn delete_review(&self, model: review::Model) -> AppResult<()> {
        model.delete(&self.db).await?;
        Ok(())
    }

    pub async fn list_comments(
        &self,
        review_id: i32,
        window: Window,
    ) -> AppResult<(Vec<CommentView>, u64)> {
        let query = comment::Entity::find().filter(comment::Column::ReviewId.eq(review_id));
        let count = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(comment::Column::PubDate)
            .order_by_desc(comment::Column::Id)
            .offset(window.offset)
            .limit(window.limit)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;
        Ok((rows.into_iter().map(|(c, a)| comment_view(c, a)).collect(), count))
    }

    pub async fn find_comment(
        &self,
        review_id: i32,
        comment_id: i32,
    ) -> AppResult<Option<comment::Model>> {
        Ok(comment::Entity::find_by_id(comment_id)
            .filter(comment::Column::ReviewId.eq(review_id))
            .one(&self.db)
            .await?)
    }

    pub async fn comment_view(&self, model: comment::Model) -> AppResult<CommentView> {
        let author = model.find_related(user::Entity).one(&self.db).await?;
        Ok(comment_view(model, author))
    }

    pub async fn create_comment(
        &self,
        review_id: i32,
        author: &user::Model,
        req: CommentRequest,
    ) -> AppResult<CommentView> {
        let model = comment::ActiveModel {
            review_id: Set(review_id),
            author_id: Set(author.id),
            text: Set(req.text),
            pub_date: Set(now_sec()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(comment_view(model, Some(author.clone())))
    }

    pub async fn update_comment(
        &self,
        current: comment::Model,
        req: UpdateCommentRequest,
    ) -> AppResult<CommentView> {
        let Some(text) = req.text else {
            return self.comment_view(current).await;
        };
        let mut model = current.into_active_model();
        model.text = Set(text);
        let model = model.update(&self.db).await?;
        self.comment_view(model).await
    }

    pub async fn delete_comment(&self, model: comment::Model) -> AppResult<()> {
        model.delete(&self.db).await?;
        Ok(())
    }
}
