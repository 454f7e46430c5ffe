//! URL slugs for articles and categories.

use std::sync::OnceLock;

use regex::Regex;

pub const ARTICLE_FALLBACK: &str = "article";
pub const CATEGORY_FALLBACK: &str = "category";

fn disallowed() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static slug pattern"))
}

fn separators() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\s_-]+").expect("static separator pattern"))
}

/// Lowercase, drop punctuation, collapse whitespace, `_` and `-` runs into one `-`, then trim
/// dashes from both ends. May return an empty string.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = disallowed().replace_all(&lowered, "");
    let dashed = separators().replace_all(&stripped, "-");
    dashed.trim_matches('-').to_string()
}

/// First free slug among `base`, `base-1`, `base-2`, ... An empty base uses `fallback`.
pub fn unique_slug<F>(text: &str, fallback: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let mut base = slugify(text);
    if base.is_empty() {
        base = fallback.to_string();
    }
    if !taken(&base) {
        return base;
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}-{counter}");
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators_and_strips_punctuation() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Budget 2025 -- Part_2"), "budget-2025-part-2");
        assert_eq!(slugify("---Edge---"), "edge");
        assert_eq!(slugify("Café Politique"), "café-politique");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn unique_slug_counts_up_from_one() {
        let existing = ["town-hall", "town-hall-1"];
        let slug = unique_slug("Town Hall", ARTICLE_FALLBACK, |candidate| {
            existing.contains(&candidate)
        });
        assert_eq!(slug, "town-hall-2");
    }

    #[test]
    fn unique_slug_falls_back_when_nothing_survives() {
        assert_eq!(unique_slug("???", CATEGORY_FALLBACK, |_| false), "category");
        assert_eq!(
            unique_slug("", ARTICLE_FALLBACK, |candidate| candidate == "article"),
            "article-1"
        );
    }
}
