use crate::{
    error::{AppError, AppResult},
    models::{micropost, Micropost, MicropostModel, PostOrder, User},
    utils::not_blank,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};
use validator::Validate;

#[derive(Debug, Validate)]
struct NewMicropost {
    #[validate(custom(function = "not_blank"), length(max = 140))]
    content: String,
}

pub struct MicropostService {
    db: DatabaseConnection,
}

impl MicropostService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, user_id: i32, content: &str) -> AppResult<MicropostModel> {
        NewMicropost {
            content: content.to_string(),
        }
        .validate()?;

        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        let model = micropost::ActiveModel {
            user_id: Set(user_id),
            content: Set(content.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Delete a post. Only its author may do so.
    pub async fn delete(&self, user_id: i32, post_id: i32) -> AppResult<()> {
        let post = Micropost::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if post.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        Micropost::delete_by_id(post.id).exec(&self.db).await?;
        Ok(())
    }

    /// A user's own posts. Returns (page_of_posts, total).
    pub async fn list_by_user(
        &self,
        user_id: i32,
        order: PostOrder,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<MicropostModel>, u64)> {
        let query = Micropost::find().filter(micropost::Column::UserId.eq(user_id));
        let paginator = order.apply(query).paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((posts, total))
    }
}
