use crate::{
    error::{AppError, AppResult},
    models::{
        micropost, relationship, user, Micropost, MicropostModel, PostOrder, Relationship, User,
        UserModel,
    },
};
use sea_orm::{
    sea_query::{OnConflict, Query},
    ActiveValue::Set,
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::collections::HashMap;

/// Follow edges between users and the feeds derived from them.
pub struct SocialGraphService {
    db: DatabaseConnection,
}

impl SocialGraphService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Add the edge follower -> followed.
    /// Returns true if the edge is new, false if it already existed.
    ///
    /// Duplicates are absorbed by the unique (follower_id, followed_id)
    /// index, so concurrent calls for the same pair leave one edge.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> AppResult<bool> {
        if follower_id == followed_id {
            return Err(AppError::Validation("Cannot follow yourself".to_string()));
        }

        let found = User::find()
            .filter(user::Column::Id.is_in([follower_id, followed_id]))
            .count(&self.db)
            .await?;
        if found < 2 {
            return Err(AppError::NotFound);
        }

        let edge = relationship::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let inserted = Relationship::insert(edge)
            .on_conflict(
                OnConflict::columns([
                    relationship::Column::FollowerId,
                    relationship::Column::FollowedId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        if inserted > 0 {
            tracing::info!(follower_id, followed_id, "Followed");
        }
        Ok(inserted > 0)
    }

    /// Remove the edge follower -> followed.
    /// Returns true if an edge was removed; a missing edge is not an error.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> AppResult<bool> {
        let result = Relationship::delete_many()
            .filter(relationship::Column::FollowerId.eq(follower_id))
            .filter(relationship::Column::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(follower_id, followed_id, "Unfollowed");
        }
        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> AppResult<bool> {
        let count = Relationship::find()
            .filter(relationship::Column::FollowerId.eq(follower_id))
            .filter(relationship::Column::FollowedId.eq(followed_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn following_count(&self, user_id: i32) -> AppResult<u64> {
        Ok(Relationship::find()
            .filter(relationship::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn followers_count(&self, user_id: i32) -> AppResult<u64> {
        Ok(Relationship::find()
            .filter(relationship::Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    /// List users who follow the given user, most recent first.
    pub async fn followers(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = Relationship::find()
            .filter(relationship::Column::FollowedId.eq(user_id))
            .order_by_desc(relationship::Column::CreatedAt)
            .order_by_desc(relationship::Column::Id)
            .paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let edges = paginator.fetch_page(page.saturating_sub(1)).await?;

        let user_ids: Vec<i32> = edges.iter().map(|e| e.follower_id).collect();
        Ok((self.users_in_order(user_ids).await?, total))
    }

    /// List users that the given user follows, most recent first.
    pub async fn following(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = Relationship::find()
            .filter(relationship::Column::FollowerId.eq(user_id))
            .order_by_desc(relationship::Column::CreatedAt)
            .order_by_desc(relationship::Column::Id)
            .paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let edges = paginator.fetch_page(page.saturating_sub(1)).await?;

        let user_ids: Vec<i32> = edges.iter().map(|e| e.followed_id).collect();
        Ok((self.users_in_order(user_ids).await?, total))
    }

    /// Posts by the user and by everyone they follow, in one query.
    /// Returns (page_of_posts, total).
    pub async fn feed(
        &self,
        user_id: i32,
        order: PostOrder,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<MicropostModel>, u64)> {
        let query = Micropost::find().filter(feed_condition(user_id));
        let paginator = order.apply(query).paginate(&self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let posts = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((posts, total))
    }

    /// Delete every edge in which the user is follower or followed.
    /// Takes a connection so it can run inside the caller's transaction.
    pub async fn sever_all<C: ConnectionTrait>(conn: &C, user_id: i32) -> AppResult<u64> {
        let result = Relationship::delete_many()
            .filter(
                Condition::any()
                    .add(relationship::Column::FollowerId.eq(user_id))
                    .add(relationship::Column::FollowedId.eq(user_id)),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn users_in_order(&self, user_ids: Vec<i32>) -> AppResult<Vec<UserModel>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        let users = User::find()
            .filter(user::Column::Id.is_in(user_ids.clone()))
            .all(&self.db)
            .await?;

        // Reorder to match edge order
        let user_map: HashMap<i32, UserModel> = users.into_iter().map(|u| (u.id, u)).collect();
        Ok(user_ids
            .into_iter()
            .filter_map(|id| user_map.get(&id).cloned())
            .collect())
    }
}

/// `user_id = :id OR user_id IN (SELECT followed_id FROM relationships
/// WHERE follower_id = :id)`
fn feed_condition(user_id: i32) -> Condition {
    let followed_ids = Query::select()
        .column(relationship::Column::FollowedId)
        .from(Relationship)
        .and_where(relationship::Column::FollowerId.eq(user_id))
        .to_owned();

    Condition::any()
        .add(micropost::Column::UserId.eq(user_id))
        .add(micropost::Column::UserId.in_subquery(followed_ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn feed_is_a_single_subquery_statement() {
        let sql = Micropost::find()
            .filter(feed_condition(42))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""user_id" = 42"#), "{sql}");
        assert!(
            sql.contains(r#"IN (SELECT "followed_id" FROM "relationships""#),
            "{sql}"
        );
        assert!(sql.contains(r#""follower_id" = 42"#), "{sql}");
    }
}
