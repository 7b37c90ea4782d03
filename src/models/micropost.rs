use sea_orm::entity::prelude::*;
use sea_orm::{Order, QueryOrder, Select};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "microposts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Ordering of micropost listings. Callers always pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    NewestFirst,
    OldestFirst,
}

impl PostOrder {
    /// Orders by creation time, breaking ties by id in the same direction.
    pub fn apply(self, query: Select<Entity>) -> Select<Entity> {
        let order = match self {
            PostOrder::NewestFirst => Order::Desc,
            PostOrder::OldestFirst => Order::Asc,
        };
        query
            .order_by(Column::CreatedAt, order.clone())
            .order_by(Column::Id, order)
    }
}
