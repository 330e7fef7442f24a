//! CSS selectors describing where links live on each tier of the archive.
//!
//! Parsing is synchronous and happens entirely inside these functions:
//! `scraper::Html` is not `Send`, so a parsed document must never be held
//! across an `.await`.

use scraper::{Html, Selector};
use thiserror::Error;

/// Root-page links to collection pages.
pub const DEFAULT_COLLECTION_SELECTOR: &str = r#"a[href^="/paper_files/paper/"]"#;

/// Collection-page links to item detail pages.
pub const DEFAULT_ITEM_SELECTOR: &str = r#"ul.paper-list li a[href$="Abstract-Conference.html"]"#;

/// Detail-page link to the downloadable artifact.
pub const DEFAULT_ARTIFACT_SELECTOR: &str = r#"a[href$="Paper-Conference.pdf"]"#;

/// Detail-page element holding the item title.
pub const DEFAULT_TITLE_SELECTOR: &str = "title";

/// A selector string that `scraper` rejected.
#[derive(Debug, Error)]
#[error("invalid {role} selector {selector:?}: {message}")]
pub struct LayoutError {
    /// Which tier the selector was meant for.
    pub role: &'static str,
    /// The rejected selector.
    pub selector: String,
    /// Parser message.
    pub message: String,
}

/// What the task runner needs from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    /// Whitespace-normalized title text, if any non-empty title exists.
    pub title: Option<String>,
    /// Raw `href` of the first matching artifact link.
    pub artifact_href: Option<String>,
}

/// Compiled selectors for the root, collection and detail tiers.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    collection: Selector,
    item: Selector,
    artifact: Selector,
    title: Selector,
}

impl SiteLayout {
    /// Compiles a layout from four selector strings.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] naming the first selector that fails to parse.
    pub fn new(
        collection: &str,
        item: &str,
        artifact: &str,
        title: &str,
    ) -> Result<Self, LayoutError> {
        Ok(Self {
            collection: compile("collection", collection)?,
            item: compile("item", item)?,
            artifact: compile("artifact", artifact)?,
            title: compile("title", title)?,
        })
    }

    /// Returns the `href` of every collection link on the root page, in document order.
    #[must_use]
    pub fn collection_links(&self, html: &str) -> Vec<String> {
        hrefs(&Html::parse_document(html), &self.collection)
    }

    /// Returns the `href` of every item link on a collection page, in document order.
    #[must_use]
    pub fn item_links(&self, html: &str) -> Vec<String> {
        hrefs(&Html::parse_document(html), &self.item)
    }

    /// Extracts the title and the first artifact link from a detail page.
    #[must_use]
    pub fn detail(&self, html: &str) -> DetailPage {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        let artifact_href = document
            .select(&self.artifact)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(str::to_string);

        DetailPage {
            title,
            artifact_href,
        }
    }
}

impl Default for SiteLayout {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new(
            DEFAULT_COLLECTION_SELECTOR,
            DEFAULT_ITEM_SELECTOR,
            DEFAULT_ARTIFACT_SELECTOR,
            DEFAULT_TITLE_SELECTOR,
        )
        .expect("default selectors are valid")
    }
}

fn compile(role: &'static str, selector: &str) -> Result<Selector, LayoutError> {
    Selector::parse(selector).map_err(|e| LayoutError {
        role,
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn hrefs(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
