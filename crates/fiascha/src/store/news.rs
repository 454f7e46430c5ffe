use super::{InMemoryStore, RepositoryError, Tables};
use crate::workflows::news::{
    Article, ArticleFilter, ArticleId, Category, CategoryId, NewArticle, NewCategory,
    NewsRepository,
};

impl Tables {
    fn category_clash(
        &self,
        name: &str,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Option<&'static str> {
        for category in self.categories.values() {
            if Some(category.id) == except {
                continue;
            }
            if category.name.eq_ignore_ascii_case(name) {
                return Some("category_name");
            }
            if category.slug == slug {
                return Some("category_slug");
            }
        }
        None
    }

    fn article_slug_in_use(&self, slug: &str, except: Option<ArticleId>) -> bool {
        self.articles
            .values()
            .any(|article| article.slug == slug && Some(article.id) != except)
    }
}

impl NewsRepository for InMemoryStore {
    fn insert_category(&self, draft: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables()?;
        if let Some(constraint) = tables.category_clash(&draft.name, &draft.slug, None) {
            return Err(RepositoryError::Conflict(constraint));
        }
        let id = CategoryId(tables.category_ids.next());
        let category = draft.into_category(id);
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(constraint) =
            tables.category_clash(&category.name, &category.slug, Some(category.id))
        {
            return Err(RepositoryError::Conflict(constraint));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    fn fetch_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.categories.get(&id).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables()?;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(categories)
    }

    fn category_article_count(&self, id: CategoryId) -> Result<usize, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .articles
            .values()
            .filter(|article| article.category == id)
            .count())
    }

    fn category_slug_taken(
        &self,
        slug: &str,
        except: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .categories
            .values()
            .any(|category| category.slug == slug && Some(category.id) != except))
    }

    fn delete_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.articles.values().any(|article| article.category == id) {
            return Err(RepositoryError::Conflict("category_articles"));
        }
        tables.categories.remove(&id).ok_or(RepositoryError::NotFound)
    }

    fn insert_article(&self, draft: NewArticle) -> Result<Article, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.article_slug_in_use(&draft.slug, None) {
            return Err(RepositoryError::Conflict("article_slug"));
        }
        let id = ArticleId(tables.article_ids.next());
        let article = draft.into_article(id);
        tables.articles.insert(id, article.clone());
        Ok(article)
    }

    fn update_article(&self, article: &Article) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.articles.contains_key(&article.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.article_slug_in_use(&article.slug, Some(article.id)) {
            return Err(RepositoryError::Conflict("article_slug"));
        }
        tables.articles.insert(article.id, article.clone());
        Ok(())
    }

    fn fetch_article(&self, id: ArticleId) -> Result<Option<Article>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.articles.get(&id).cloned())
    }

    fn find_article_by_slug(&self, slug: &str) -> Result<Option<Article>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .articles
            .values()
            .find(|article| article.slug == slug)
            .cloned())
    }

    fn article_slug_taken(
        &self,
        slug: &str,
        except: Option<ArticleId>,
    ) -> Result<bool, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.article_slug_in_use(slug, except))
    }

    fn query_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, RepositoryError> {
        let tables = self.tables()?;
        let mut articles: Vec<Article> = tables
            .articles
            .values()
            .filter(|article| filter.matches(article))
            .cloned()
            .collect();
        articles.sort_by(|left, right| {
            right
                .publish_date
                .cmp(&left.publish_date)
                .then(right.id.cmp(&left.id))
        });
        Ok(articles)
    }

    fn record_article_view(&self, id: ArticleId) -> Result<Article, RepositoryError> {
        let mut tables = self.tables()?;
        let article = tables
            .articles
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        article.views += 1;
        Ok(article.clone())
    }

    fn delete_article(&self, id: ArticleId) -> Result<Article, RepositoryError> {
        let mut tables = self.tables()?;
        tables.articles.remove(&id).ok_or(RepositoryError::NotFound)
    }
}
