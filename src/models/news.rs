//! News site and article models

use super::page::WebPage;
use crate::crawler::Fetcher;
use crate::selector::extract;
use crate::FetchError;
use serde::Serialize;

/// A news site whose front page lists articles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsSite {
    pub page: WebPage,
    pub articles: Vec<Article>,
}

/// One article fragment taken from a news site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub page: WebPage,
}

impl Article {
    pub fn new(name: impl Into<String>, url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            page: WebPage::new(name, url, html),
        }
    }
}

impl NewsSite {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            page: WebPage::new(name, url, ""),
            articles: Vec::new(),
        }
    }

    /// Fetches the site and replaces `articles` with one per matched fragment
    ///
    /// Each article is named `"Article"`, carries the site URL and holds the
    /// fragment as its markup. The fetched page is kept in `page.html`.
    /// Returns the number of articles found.
    pub async fn scrape_articles<F: Fetcher>(
        &mut self,
        fetcher: &F,
        selector: &str,
    ) -> Result<usize, FetchError> {
        let html = fetcher.fetch_text(&self.page.url).await?;

        self.articles = extract(&html, selector)
            .into_iter()
            .map(|fragment| Article::new("Article", self.page.url.clone(), fragment))
            .collect();
        tracing::debug!(
            "{}: {} articles matched {}",
            self.page.url,
            self.articles.len(),
            selector
        );

        self.page.html = html;
        Ok(self.articles.len())
    }
}
