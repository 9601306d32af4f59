//! URL handling module
//!
//! Holds the site-scoped filter/normalize policy that turns raw `href` values
//! extracted from a page into crawlable, fully qualified URLs.

mod screen;

pub use screen::LinkScreen;
