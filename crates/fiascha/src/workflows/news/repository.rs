use super::domain::{Article, ArticleId, Category, CategoryId, NewArticle, NewCategory};
use super::query::ArticleFilter;
use crate::store::RepositoryError;

/// Storage abstraction for news categories and articles.
pub trait NewsRepository: Send + Sync {
    /// Category names and slugs are unique.
    fn insert_category(&self, draft: NewCategory) -> Result<Category, RepositoryError>;
    fn update_category(&self, category: &Category) -> Result<(), RepositoryError>;
    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;
    /// Every category ordered by name.
    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    fn category_article_count(&self, id: CategoryId) -> Result<usize, RepositoryError>;
    fn category_slug_taken(
        &self,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepositoryError>;
    /// Refused with `Conflict` while any article references the category.
    fn delete_category(&self, id: CategoryId) -> Result<Category, RepositoryError>;

    /// Article slugs are unique.
    fn insert_article(&self, draft: NewArticle) -> Result<Article, RepositoryError>;
    fn update_article(&self, article: &Article) -> Result<(), RepositoryError>;
    fn fetch_article(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError>;
    fn find_article_by_slug(&self, slug: &str) -> Result<Option<Article>, RepositoryError>;
    fn article_slug_taken(
        &self,
        slug: &str,
        except: Option<ArticleId>,
    ) -> Result<bool, RepositoryError>;
    /// Articles matching `filter`, newest publish date first.
    fn query_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, RepositoryError>;
    /// Increment the view counter and return the stored row.
    fn record_article_view(&self, id: ArticleId) -> Result<Article, RepositoryError>;
    fn delete_article(&self, id: ArticleId) -> Result<Article, RepositoryError>;
}
