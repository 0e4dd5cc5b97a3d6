//! Web store and product models

use super::page::WebPage;
use crate::crawler::Fetcher;
use crate::selector::{extract, fragment_text};
use crate::FetchError;
use serde::Serialize;

/// Selector used by [`Product::scrape_description`] when none is given
pub const DEFAULT_DESCRIPTION_SELECTOR: &str = r#"//div[@class="product-description"]"#;

/// A web store whose listing page holds product fragments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebStore {
    pub page: WebPage,
    pub products: Vec<Product>,
}

/// One product fragment, optionally with a scraped description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub page: WebPage,
    pub description: Option<String>,
}

impl WebStore {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            page: WebPage::new(name, url, ""),
            products: Vec::new(),
        }
    }

    /// Fetches the store and replaces `products` with one per matched fragment
    ///
    /// Returns the number of products found.
    pub async fn scrape_products<F: Fetcher>(
        &mut self,
        fetcher: &F,
        selector: &str,
    ) -> Result<usize, FetchError> {
        let html = fetcher.fetch_text(&self.page.url).await?;

        self.products = extract(&html, selector)
            .into_iter()
            .map(|fragment| Product::new("Product", self.page.url.clone(), fragment))
            .collect();
        tracing::debug!(
            "{}: {} products matched {}",
            self.page.url,
            self.products.len(),
            selector
        );

        self.page.html = html;
        Ok(self.products.len())
    }
}

impl Product {
    pub fn new(name: impl Into<String>, url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            page: WebPage::new(name, url, html),
            description: None,
        }
    }

    /// Sets `description` from `markup` (usually the product's own page)
    ///
    /// The text of every fragment matching `selector` (default
    /// [`DEFAULT_DESCRIPTION_SELECTOR`]) is joined with single spaces. When
    /// nothing matches, the description becomes `None`. Returns the
    /// description just scraped.
    pub fn scrape_description(&mut self, markup: &str, selector: Option<&str>) -> Option<&str> {
        let selector = selector.unwrap_or(DEFAULT_DESCRIPTION_SELECTOR);
        let texts: Vec<String> = extract(markup, selector)
            .into_iter()
            .map(fragment_text)
            .collect();

        self.description = (!texts.is_empty()).then(|| texts.join(" "));
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OnePage(&'static str);

    impl Fetcher for OnePage {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_scrape_products() {
        let listing = OnePage(
            r#"<ul>
                <li class="product-item">Lamp</li>
                <li class="product-item">Chair</li>
                <li class="banner">Sale</li>
            </ul>"#,
        );
        let mut store = WebStore::new("Shop", "https://shop.test/");

        let count = store.scrape_products(&listing, ".product-item").await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(store.products[0].page.name, "Product");
        assert_eq!(store.products[1].page.url, "https://shop.test/");
        assert_eq!(
            store.products[1].page.html,
            r#"<li class="product-item">Chair</li>"#
        );
        assert!(store.products.iter().all(|p| p.description.is_none()));
    }

    #[test]
    fn test_scrape_description_default_selector() {
        let markup = r#"<div class="product-description"> A sturdy
            <b>oak</b> chair. </div><div class="specs">4 legs</div>"#;
        let mut product = Product::new("Product", "https://shop.test/chair", "");

        let description = product.scrape_description(markup, None);

        assert_eq!(description, Some("A sturdy oak chair."));
        assert_eq!(product.description.as_deref(), Some("A sturdy oak chair."));
    }

    #[test]
    fn test_scrape_description_joins_matches() {
        let markup = r#"<p class="d">One</p><p class="d">Two</p>"#;
        let mut product = Product::new("Product", "https://shop.test/x", "");

        product.scrape_description(markup, Some(r#"//p[@class="d"]"#));
        assert_eq!(product.description.as_deref(), Some("One Two"));
    }

    #[test]
    fn test_scrape_description_no_match() {
        let mut product = Product::new("Product", "https://shop.test/x", "");
        assert_eq!(product.scrape_description("<p>nothing</p>", None), None);
        assert!(product.description.is_none());
    }

    #[test]
    fn test_scrape_description_no_match_replaces_previous() {
        let mut product = Product::new("Product", "https://shop.test/x", "");
        product.scrape_description(r#"<div class="product-description">Old</div>"#, None);
        assert_eq!(product.description.as_deref(), Some("Old"));

        assert_eq!(product.scrape_description("<p>gone</p>", None), None);
        assert!(product.description.is_none());
    }
}
