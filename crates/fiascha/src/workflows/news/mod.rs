//! News desk: categories, articles with unique slugs, public listing and search.

pub mod domain;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod slug;

pub use domain::{Article, ArticleId, Category, CategoryId, NewArticle, NewCategory};
pub use query::{ArticleFilter, Page};
pub use repository::NewsRepository;
pub use router::news_router;
pub use service::{
    ArticleForm, ArticleListing, ArticleView, CategoryForm, CategorySummary, ListParams,
    NewsError, NewsService, SearchParams,
};
