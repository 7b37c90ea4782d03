pub mod bootstrap_admin;
pub mod email;
pub mod identity;
pub mod micropost;
pub mod social_graph;

pub use email::{EmailService, Mailer};
pub use identity::{
    authenticated, password_reset_expired, password_reset_expired_at, IdentityService, NewUser,
    ProfileUpdate,
};
pub use micropost::MicropostService;
pub use social_graph::SocialGraphService;
