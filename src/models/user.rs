use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Always stored lowercase, see [`normalize_email`].
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub remember_hash: Option<String>,
    #[serde(skip_serializing)]
    pub activation_hash: Option<String>,
    pub activated: bool,
    pub activated_at: Option<DateTime>,
    #[serde(skip_serializing)]
    pub reset_hash: Option<String>,
    pub reset_sent_at: Option<DateTime>,
    pub admin: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::micropost::Entity")]
    Microposts,
}

impl Related<super::micropost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Microposts.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let ActiveValue::Set(email) = &self.email {
            let normalized = normalize_email(email);
            if normalized != *email {
                self.email = ActiveValue::Set(normalized);
            }
        }
        Ok(self)
    }
}

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Bearer credentials whose digests live on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Remember,
    Activation,
    Reset,
}

impl Model {
    /// Stored digest for the given credential kind, if one is issued.
    pub fn digest_for(&self, kind: TokenKind) -> Option<&str> {
        match kind {
            TokenKind::Remember => self.remember_hash.as_deref(),
            TokenKind::Activation => self.activation_hash.as_deref(),
            TokenKind::Reset => self.reset_hash.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Model {
        let now = chrono::Utc::now().naive_utc();
        Model {
            id: 1,
            name: "Example User".to_string(),
            email: "user@example.com".to_string(),
            password_hash: "pw".to_string(),
            remember_hash: Some("remember".to_string()),
            activation_hash: None,
            activated: false,
            activated_at: None,
            reset_hash: Some("reset".to_string()),
            reset_sent_at: Some(now),
            admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn digest_lookup_by_kind() {
        let user = sample();
        assert_eq!(user.digest_for(TokenKind::Remember), Some("remember"));
        assert_eq!(user.digest_for(TokenKind::Activation), None);
        assert_eq!(user.digest_for(TokenKind::Reset), Some("reset"));
    }

    #[test]
    fn normalize_lowercases() {
        assert_eq!(normalize_email("Foo@Bar.COM"), "foo@bar.com");
    }

    #[test]
    fn serialization_hides_digests() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("remember_hash").is_none());
        assert!(json.get("activation_hash").is_none());
        assert!(json.get("reset_hash").is_none());
        assert_eq!(json["email"], "user@example.com");
    }
}
