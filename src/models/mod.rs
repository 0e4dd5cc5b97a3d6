//! Domain models built on top of selector extraction
//!
//! Pages carry a name, a source URL, their markup and free-form attributes.
//! News sites and web stores fetch their listing page through a
//! [`Fetcher`](crate::crawler::Fetcher) and split it into articles or
//! products with a selector.

mod news;
mod page;
mod store;

pub use news::{Article, NewsSite};
pub use page::{format_markup, AttrValue, Attributes, WebPage};
pub use store::{Product, WebStore, DEFAULT_DESCRIPTION_SELECTOR};
