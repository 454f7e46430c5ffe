use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Article, ArticleId, Category, CategoryId, NewArticle, NewCategory};
use super::query::{ArticleFilter, Page};
use super::repository::NewsRepository;
use super::slug::{unique_slug, ARTICLE_FALLBACK, CATEGORY_FALLBACK};
use crate::accounts::access::{load_actor, require};
use crate::accounts::{AccessError, Account, AccountId, AccountRepository, Capability};
use crate::clock::Clock;
use crate::config::PortalConfig;
use crate::store::RepositoryError;
use crate::validation::{optional_text, FieldErrors};

const RELATED_ARTICLES: usize = 3;
const MAX_QUERY_CHARS: usize = 100;
const DEFAULT_COLOR: &str = "#3498db";

/// Query string of the public listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub category: Option<u64>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<u64>,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// An article with its category and author resolved for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleListing {
    #[serde(flatten)]
    pub article: Article,
    pub category_name: String,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub article: ArticleListing,
    pub related: Vec<ArticleListing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub article_count: usize,
}

struct ValidArticle {
    title: String,
    summary: Option<String>,
    content: String,
    category: CategoryId,
}

struct ValidCategory {
    name: String,
    description: Option<String>,
    color: String,
}

pub struct NewsService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    articles_per_page: usize,
    search_results_per_page: usize,
}

impl<S> NewsService<S>
where
    S: AccountRepository + NewsRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: &PortalConfig) -> Self {
        Self {
            store,
            clock,
            articles_per_page: config.articles_per_page,
            search_results_per_page: config.search_results_per_page,
        }
    }

    /// Published articles, newest first, one page at a time.
    pub fn list(&self, params: ListParams) -> Result<Page<ArticleListing>, NewsError> {
        let filter = ArticleFilter {
            category: params.category.map(CategoryId),
            featured_only: params.featured.unwrap_or(false),
            ..ArticleFilter::published()
        };
        let articles = self.store.query_articles(&filter)?;
        let page = Page::paginate(articles, params.page.unwrap_or(1), self.articles_per_page);
        self.resolve_page(page)
    }

    pub fn search(&self, params: SearchParams) -> Result<Page<ArticleListing>, NewsError> {
        let text = optional_text(params.query);
        if let Some(text) = &text {
            let mut errors = FieldErrors::new();
            errors.check_length(
                "query",
                text,
                0,
                Some(MAX_QUERY_CHARS),
                "Search query must be less than 100 characters",
            );
            errors.into_result()?;
        }
        let filter = ArticleFilter {
            category: params.category.map(CategoryId),
            text,
            ..ArticleFilter::published()
        };
        let articles = self.store.query_articles(&filter)?;
        let page = Page::paginate(
            articles,
            params.page.unwrap_or(1),
            self.search_results_per_page,
        );
        self.resolve_page(page)
    }

    /// Open an article by slug, counting the view. Drafts are only visible to readers who may
    /// see unpublished work; everyone else gets `NotFound`.
    pub fn read(&self, reader: Option<AccountId>, slug: &str) -> Result<ArticleView, NewsError> {
        let article = self
            .store
            .find_article_by_slug(slug)?
            .ok_or_else(|| NewsError::ArticleNotFound(slug.to_string()))?;
        if !article.is_published {
            let may_preview = match reader {
                Some(id) => load_actor::<_, NewsError>(self.store.as_ref(), id)?
                    .can(Capability::ViewUnpublished),
                None => false,
            };
            if !may_preview {
                return Err(NewsError::ArticleNotFound(slug.to_string()));
            }
        }

        let article = self.store.record_article_view(article.id)?;
        let related: Vec<Article> = self
            .store
            .query_articles(&ArticleFilter {
                category: Some(article.category),
                ..ArticleFilter::published()
            })?
            .into_iter()
            .filter(|candidate| candidate.id != article.id)
            .take(RELATED_ARTICLES)
            .collect();

        let names = self.names()?;
        Ok(ArticleView {
            article: names.listing(article),
            related: related
                .into_iter()
                .map(|article| names.listing(article))
                .collect(),
        })
    }

    pub fn create_article(
        &self,
        author: AccountId,
        form: ArticleForm,
    ) -> Result<Article, NewsError> {
        let author = self.writer(author)?;
        let is_published = form.is_published;
        let is_featured = form.is_featured;
        let valid = self.validate_article(form)?;

        let slug = self.article_slug(&valid.title, None)?;
        let article = self.store.insert_article(NewArticle {
            title: valid.title,
            slug,
            summary: valid.summary,
            content: valid.content,
            category: valid.category,
            author: author.id,
            is_published,
            is_featured,
            created_at: self.clock.now(),
        })?;
        info!(article = %article.id, author = %author.id, slug = %article.slug, "article created");
        Ok(article)
    }

    /// Replace an article's content. The slug is regenerated from the title but an article
    /// keeps its own slug when the title still maps to it.
    pub fn update_article(
        &self,
        editor: AccountId,
        id: ArticleId,
        form: ArticleForm,
    ) -> Result<Article, NewsError> {
        let editor = self.writer(editor)?;
        let mut article = self
            .store
            .fetch_article(id)?
            .ok_or_else(|| NewsError::ArticleNotFound(id.to_string()))?;
        let is_published = form.is_published;
        let is_featured = form.is_featured;
        let valid = self.validate_article(form)?;

        article.slug = self.article_slug(&valid.title, Some(article.id))?;
        article.title = valid.title;
        article.summary = valid.summary;
        article.content = valid.content;
        article.category = valid.category;
        article.is_published = is_published;
        article.is_featured = is_featured;
        article.updated_at = self.clock.now();
        self.store.update_article(&article)?;

        info!(article = %article.id, editor = %editor.id, "article updated");
        Ok(article)
    }

    pub fn delete_article(&self, editor: AccountId, id: ArticleId) -> Result<Article, NewsError> {
        let editor = self.writer(editor)?;
        let article = self.store.delete_article(id).map_err(|error| match error {
            RepositoryError::NotFound => NewsError::ArticleNotFound(id.to_string()),
            other => other.into(),
        })?;
        info!(article = %article.id, editor = %editor.id, "article deleted");
        Ok(article)
    }

    /// Every category with how many articles reference it.
    pub fn categories(&self) -> Result<Vec<CategorySummary>, NewsError> {
        let mut summaries = Vec::new();
        for category in self.store.list_categories()? {
            let article_count = self.store.category_article_count(category.id)?;
            summaries.push(CategorySummary {
                category,
                article_count,
            });
        }
        Ok(summaries)
    }

    pub fn create_category(
        &self,
        actor: AccountId,
        form: CategoryForm,
    ) -> Result<Category, NewsError> {
        let actor = self.curator(actor)?;
        let valid = validate_category(form)?;
        let slug = self.category_slug(&valid.name, None)?;

        let category = self
            .store
            .insert_category(NewCategory {
                name: valid.name,
                slug,
                description: valid.description,
                color: valid.color,
                created_at: self.clock.now(),
            })
            .map_err(category_conflict)?;
        info!(category = %category.id, actor = %actor.id, "news category created");
        Ok(category)
    }

    pub fn update_category(
        &self,
        actor: AccountId,
        id: CategoryId,
        form: CategoryForm,
    ) -> Result<Category, NewsError> {
        let actor = self.curator(actor)?;
        let mut category = self
            .store
            .fetch_category(id)?
            .ok_or(NewsError::CategoryNotFound(id))?;
        let valid = validate_category(form)?;

        category.slug = self.category_slug(&valid.name, Some(id))?;
        category.name = valid.name;
        category.description = valid.description;
        category.color = valid.color;
        self.store
            .update_category(&category)
            .map_err(category_conflict)?;

        info!(category = %category.id, actor = %actor.id, "news category updated");
        Ok(category)
    }

    pub fn delete_category(&self, actor: AccountId, id: CategoryId) -> Result<Category, NewsError> {
        let actor = self.curator(actor)?;
        let category = self.store.delete_category(id).map_err(|error| match error {
            RepositoryError::NotFound => NewsError::CategoryNotFound(id),
            RepositoryError::Conflict(_) => NewsError::CategoryInUse(id),
            other => other.into(),
        })?;
        info!(category = %category.id, actor = %actor.id, "news category deleted");
        Ok(category)
    }

    fn writer(&self, id: AccountId) -> Result<Account, NewsError> {
        let account = load_actor::<_, NewsError>(self.store.as_ref(), id)?;
        require(&account, Capability::WriteArticles)?;
        Ok(account)
    }

    fn curator(&self, id: AccountId) -> Result<Account, NewsError> {
        let account = load_actor::<_, NewsError>(self.store.as_ref(), id)?;
        require(&account, Capability::ManageCategories)?;
        Ok(account)
    }

    fn validate_article(&self, form: ArticleForm) -> Result<ValidArticle, NewsError> {
        let mut errors = FieldErrors::new();
        let title = form.title.trim().to_string();
        if errors.require("title", &title, "Title is required") {
            errors.check_length(
                "title",
                &title,
                1,
                Some(200),
                "Title must be between 1 and 200 characters",
            );
        }
        let summary = optional_text(form.summary);
        if let Some(summary) = &summary {
            errors.check_length(
                "summary",
                summary,
                0,
                Some(500),
                "Summary must be less than 500 characters",
            );
        }
        let content = form.content.trim().to_string();
        if errors.require("content", &content, "Content is required") {
            errors.check_length(
                "content",
                &content,
                10,
                None,
                "Content must be at least 10 characters long",
            );
        }
        let category = match form.category_id.map(CategoryId) {
            Some(id) => {
                let exists = self.store.fetch_category(id)?.is_some();
                if !exists {
                    errors.push("category_id", "Not a valid choice");
                }
                exists.then_some(id)
            }
            None => {
                errors.push("category_id", "Please select a category");
                None
            }
        };
        errors.into_result()?;
        let category =
            category.ok_or_else(|| FieldErrors::single("category_id", "Please select a category"))?;

        Ok(ValidArticle {
            title,
            summary,
            content,
            category,
        })
    }

    fn article_slug(&self, title: &str, except: Option<ArticleId>) -> Result<String, NewsError> {
        let mut failure = None;
        let slug = unique_slug(title, ARTICLE_FALLBACK, |candidate| {
            match self.store.article_slug_taken(candidate, except) {
                Ok(taken) => taken,
                Err(error) => {
                    failure = Some(error);
                    false
                }
            }
        });
        match failure {
            Some(error) => Err(error.into()),
            None => Ok(slug),
        }
    }

    fn category_slug(&self, name: &str, except: Option<CategoryId>) -> Result<String, NewsError> {
        let mut failure = None;
        let slug = unique_slug(name, CATEGORY_FALLBACK, |candidate| {
            match self.store.category_slug_taken(candidate, except) {
                Ok(taken) => taken,
                Err(error) => {
                    failure = Some(error);
                    false
                }
            }
        });
        match failure {
            Some(error) => Err(error.into()),
            None => Ok(slug),
        }
    }

    fn names(&self) -> Result<Names, NewsError> {
        let categories = self
            .store
            .list_categories()?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect();
        let authors = self
            .store
            .list_accounts()?
            .into_iter()
            .map(|account| (account.id, account.display_name().to_string()))
            .collect();
        Ok(Names {
            categories,
            authors,
        })
    }

    fn resolve_page(&self, page: Page<Article>) -> Result<Page<ArticleListing>, NewsError> {
        let names = self.names()?;
        Ok(page.map(|article| names.listing(article)))
    }
}

struct Names {
    categories: HashMap<CategoryId, String>,
    authors: HashMap<AccountId, String>,
}

impl Names {
    fn listing(&self, article: Article) -> ArticleListing {
        ArticleListing {
            category_name: self
                .categories
                .get(&article.category)
                .cloned()
                .unwrap_or_default(),
            author_name: self
                .authors
                .get(&article.author)
                .cloned()
                .unwrap_or_default(),
            article,
        }
    }
}

fn validate_category(form: CategoryForm) -> Result<ValidCategory, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = form.name.trim().to_string();
    if errors.require("name", &name, "Category name is required") {
        errors.check_length(
            "name",
            &name,
            1,
            Some(50),
            "Category name must be between 1 and 50 characters",
        );
    }
    let description = optional_text(form.description);
    if let Some(description) = &description {
        errors.check_length(
            "description",
            description,
            0,
            Some(500),
            "Description must be less than 500 characters",
        );
    }
    let color = optional_text(form.color).unwrap_or_else(|| DEFAULT_COLOR.to_string());
    errors.check_hex_color("color", &color);
    errors.into_result()?;

    Ok(ValidCategory {
        name,
        description,
        color,
    })
}

fn category_conflict(error: RepositoryError) -> NewsError {
    match error {
        RepositoryError::Conflict("category_name") => {
            FieldErrors::single("name", "A category with this name already exists").into()
        }
        other => other.into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("article {0} not found")]
    ArticleNotFound(String),
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("Cannot delete category with existing articles. Please reassign or delete the articles first.")]
    CategoryInUse(CategoryId),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::accounts::{NewAccount, Role};
    use crate::clock::ManualClock;
    use crate::store::InMemoryStore;

    struct Fixture {
        service: NewsService<InMemoryStore>,
        clock: Arc<ManualClock>,
        admin: AccountId,
        reporter: AccountId,
        citizen: AccountId,
    }

    fn fixture(articles_per_page: usize) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 7, 0, 0).unwrap(),
        ));
        let add = |username: &str, role: Role, is_admin: bool| {
            store
                .insert_account(NewAccount {
                    username: username.to_string(),
                    email: format!("{username}@fiascha.gov"),
                    credential_hash: "sha256$1$00$00".to_string(),
                    full_name: None,
                    role,
                    is_admin,
                    created_at: clock.now(),
                })
                .unwrap()
                .id
        };
        let admin = add("president", Role::President, true);
        let reporter = add("reporter", Role::Journalist, false);
        let citizen = add("citizen", Role::Citizen, false);
        let config = PortalConfig {
            articles_per_page,
            ..PortalConfig::default()
        };
        Fixture {
            service: NewsService::new(store, clock.clone(), &config),
            clock,
            admin,
            reporter,
            citizen,
        }
    }

    fn category(fx: &Fixture, name: &str) -> CategoryId {
        fx.service
            .create_category(
                fx.admin,
                CategoryForm {
                    name: name.to_string(),
                    ..CategoryForm::default()
                },
            )
            .unwrap()
            .id
    }

    fn article_form(title: &str, category: CategoryId, published: bool) -> ArticleForm {
        ArticleForm {
            title: title.to_string(),
            summary: None,
            content: "The assembly met to discuss the harbour budget.".to_string(),
            category_id: Some(category.0),
            is_published: published,
            is_featured: false,
        }
    }

    #[test]
    fn citizens_cannot_write_and_journalists_cannot_curate() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");

        assert!(matches!(
            fx.service
                .create_article(fx.citizen, article_form("Hello", politics, true)),
            Err(NewsError::Access(AccessError::PermissionDenied(
                Capability::WriteArticles
            )))
        ));
        assert!(matches!(
            fx.service.create_category(
                fx.reporter,
                CategoryForm {
                    name: "Sports".into(),
                    ..CategoryForm::default()
                }
            ),
            Err(NewsError::Access(AccessError::PermissionDenied(
                Capability::ManageCategories
            )))
        ));
    }

    #[test]
    fn article_form_reports_every_problem() {
        let fx = fixture(12);
        let form = ArticleForm {
            title: " ".into(),
            content: "short".into(),
            category_id: Some(77),
            ..ArticleForm::default()
        };
        match fx.service.create_article(fx.reporter, form) {
            Err(NewsError::Validation(errors)) => {
                assert!(errors.has("title"));
                assert!(errors.has("content"));
                assert!(errors.has("category_id"));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn slugs_are_unique_and_stable_on_resave() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");
        let first = fx
            .service
            .create_article(fx.reporter, article_form("Budget Day!", politics, true))
            .unwrap();
        let second = fx
            .service
            .create_article(fx.reporter, article_form("Budget day", politics, true))
            .unwrap();
        assert_eq!(first.slug, "budget-day");
        assert_eq!(second.slug, "budget-day-1");

        let resaved = fx
            .service
            .update_article(fx.reporter, first.id, article_form("Budget Day!", politics, true))
            .unwrap();
        assert_eq!(resaved.slug, "budget-day");
    }

    #[test]
    fn drafts_are_hidden_from_readers_without_preview_rights() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");
        let draft = fx
            .service
            .create_article(fx.reporter, article_form("Secret plan", politics, false))
            .unwrap();

        assert!(matches!(
            fx.service.read(None, &draft.slug),
            Err(NewsError::ArticleNotFound(_))
        ));
        assert!(matches!(
            fx.service.read(Some(fx.citizen), &draft.slug),
            Err(NewsError::ArticleNotFound(_))
        ));
        let view = fx.service.read(Some(fx.admin), &draft.slug).unwrap();
        assert_eq!(view.article.article.views, 1);
    }

    #[test]
    fn reading_counts_views_and_lists_three_related() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");
        let sports = category(&fx, "Sports");
        let mut slugs = Vec::new();
        for index in 0..5 {
            fx.clock.advance(Duration::hours(1));
            let article = fx
                .service
                .create_article(
                    fx.reporter,
                    article_form(&format!("Politics {index}"), politics, true),
                )
                .unwrap();
            slugs.push(article.slug);
        }
        fx.service
            .create_article(fx.reporter, article_form("Match report", sports, true))
            .unwrap();

        fx.service.read(None, &slugs[0]).unwrap();
        let view = fx.service.read(None, &slugs[0]).unwrap();
        assert_eq!(view.article.article.views, 2);
        assert_eq!(view.article.category_name, "Politics");
        let related: Vec<&str> = view
            .related
            .iter()
            .map(|listing| listing.article.slug.as_str())
            .collect();
        assert_eq!(related, vec!["politics-4", "politics-3", "politics-2"]);
    }

    #[test]
    fn listing_paginates_published_articles_newest_first() {
        let fx = fixture(2);
        let politics = category(&fx, "Politics");
        for index in 0..3 {
            fx.clock.advance(Duration::hours(1));
            fx.service
                .create_article(
                    fx.reporter,
                    article_form(&format!("Story {index}"), politics, true),
                )
                .unwrap();
        }
        fx.service
            .create_article(fx.reporter, article_form("Draft", politics, false))
            .unwrap();

        let first = fx.service.list(ListParams::default()).unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.items[0].article.title, "Story 2");
        assert!(first.has_next);

        let beyond = fx
            .service
            .list(ListParams {
                page: Some(5),
                ..ListParams::default()
            })
            .unwrap();
        assert!(beyond.items.is_empty());
    }

    #[test]
    fn search_matches_case_insensitively_and_bounds_the_query() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");
        fx.service
            .create_article(fx.reporter, article_form("Harbour vote", politics, true))
            .unwrap();

        let hits = fx
            .service
            .search(SearchParams {
                query: Some("HARBOUR".into()),
                ..SearchParams::default()
            })
            .unwrap();
        assert_eq!(hits.total, 1);

        assert!(matches!(
            fx.service.search(SearchParams {
                query: Some("x".repeat(101)),
                ..SearchParams::default()
            }),
            Err(NewsError::Validation(_))
        ));
    }

    #[test]
    fn categories_in_use_cannot_be_deleted() {
        let fx = fixture(12);
        let politics = category(&fx, "Politics");
        let article = fx
            .service
            .create_article(fx.reporter, article_form("Vote", politics, true))
            .unwrap();

        assert!(matches!(
            fx.service.delete_category(fx.admin, politics),
            Err(NewsError::CategoryInUse(_))
        ));
        let summaries = fx.service.categories().unwrap();
        assert_eq!(summaries[0].article_count, 1);

        fx.service.delete_article(fx.reporter, article.id).unwrap();
        fx.service.delete_category(fx.admin, politics).unwrap();
        assert!(fx.service.categories().unwrap().is_empty());
    }

    #[test]
    fn duplicate_category_names_are_a_field_error() {
        let fx = fixture(12);
        category(&fx, "Politics");
        match fx.service.create_category(
            fx.admin,
            CategoryForm {
                name: "politics".into(),
                ..CategoryForm::default()
            },
        ) {
            Err(NewsError::Validation(errors)) => assert!(errors.has("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
