use serde::Serialize;

use super::domain::{Article, CategoryId};

/// Row filter pushed down to the news repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub published_only: bool,
    pub category: Option<CategoryId>,
    pub featured_only: bool,
    /// Case-insensitive substring over title, summary and content.
    pub text: Option<String>,
}

impl ArticleFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        if self.published_only && !article.is_published {
            return false;
        }
        if self.featured_only && !article.is_featured {
            return false;
        }
        if self.category.is_some_and(|category| article.category != category) {
            return false;
        }
        match self.text.as_deref() {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                article.title.to_lowercase().contains(&needle)
                    || article.content.to_lowercase().contains(&needle)
                    || article
                        .summary
                        .as_deref()
                        .is_some_and(|summary| summary.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// One page of results. Pages are 1-based; a page past the end is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let pages = total.div_ceil(per_page);
        let items: Vec<T> = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            items,
            page,
            per_page,
            total,
            pages,
            has_prev: page > 1,
            has_next: page < pages,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_prev: self.has_prev,
            has_next: self.has_next,
        }
    }
}
