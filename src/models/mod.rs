pub mod micropost;
pub mod relationship;
pub mod user;

pub use micropost::{Entity as Micropost, Model as MicropostModel, PostOrder};
pub use relationship::{Entity as Relationship, Model as RelationshipModel};
pub use user::{Entity as User, Model as UserModel, TokenKind};
