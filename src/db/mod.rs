mod article;
mod connection;
pub mod core;
mod mystery;

pub use self::article::{Article, ArticleDigest, NewArticle, UnlocatedArticle};
pub use self::core::Database;
pub use self::mystery::MysteryRow;
