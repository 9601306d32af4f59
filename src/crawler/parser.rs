//! HTML parser for wiki article pages
//!
//! This module handles parsing fetched pages to extract:
//! - Raw `href` values of every anchor on the page
//! - The article title and heading
//! - The article body as `<h2>`, `<h3>` and `<text>` segments

use crate::crawler::extractor::{ExtractedContent, Extractor};
use crate::{CrawlError, Result};
use scraper::{ElementRef, Html, Selector};

/// Extractor for MediaWiki-style article markup
///
/// # Content Rules
///
/// - heading: `span.mw-page-title-main`, else `h1.firstHeading`
/// - title: `<title>`, else the heading
/// - body: direct children of `div.mw-parser-output` that are `<p>` paragraphs
///   or `div.mw-heading2` / `div.mw-heading3` section headings
/// - trailing section headings with no paragraph after them are dropped
/// - blocks with no text are skipped
#[derive(Debug, Clone)]
pub struct WikiExtractor {
    anchors: Selector,
    title: Selector,
    title_main: Selector,
    first_heading: Selector,
    body: Selector,
}

impl WikiExtractor {
    pub fn new() -> Self {
        Self {
            anchors: selector("a[href]"),
            title: selector("title"),
            title_main: selector("span.mw-page-title-main"),
            first_heading: selector("h1.firstHeading"),
            body: selector("div.mw-parser-output"),
        }
    }

    fn first_text(&self, document: &Html, selector: &Selector) -> Option<String> {
        document
            .select(selector)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
    }
}

impl Default for WikiExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for WikiExtractor {
    fn extract_links(&self, body: &[u8]) -> Result<Vec<String>> {
        if body.is_empty() {
            return Err(CrawlError::LinkExtract {
                reason: "empty document".to_string(),
            });
        }

        let document = Html::parse_document(&String::from_utf8_lossy(body));

        Ok(document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect())
    }

    fn extract_content(&self, body: &[u8]) -> Result<ExtractedContent> {
        let document = Html::parse_document(&String::from_utf8_lossy(body));

        let heading = self
            .first_text(&document, &self.title_main)
            .or_else(|| self.first_text(&document, &self.first_heading))
            .ok_or_else(|| CrawlError::ContentExtract {
                reason: "no page heading".to_string(),
            })?;

        let title = self
            .first_text(&document, &self.title)
            .unwrap_or_else(|| heading.clone());

        let container = document
            .select(&self.body)
            .next()
            .ok_or_else(|| CrawlError::ContentExtract {
                reason: "no article body".to_string(),
            })?;

        let mut blocks: Vec<Block> = container
            .children()
            .filter_map(ElementRef::wrap)
            .filter_map(Block::classify)
            .collect();

        // Drop headings that close the article with no paragraph after them
        while matches!(blocks.last(), Some(block) if !block.is_paragraph()) {
            blocks.pop();
        }

        let content = blocks.iter().filter_map(Block::render).collect();

        Ok(ExtractedContent {
            title,
            heading,
            content,
        })
    }
}

/// A kept child of the article body
enum Block {
    Section(String),
    Subsection(String),
    Paragraph(String),
}

impl Block {
    fn classify(element: ElementRef<'_>) -> Option<Self> {
        let value = element.value();
        match value.name() {
            "p" => Some(Self::Paragraph(element_text(element))),
            "div" if value.classes().any(|c| c == "mw-heading2") => {
                Some(Self::Section(element_text(element)))
            }
            "div" if value.classes().any(|c| c == "mw-heading3") => {
                Some(Self::Subsection(element_text(element)))
            }
            _ => None,
        }
    }

    fn is_paragraph(&self) -> bool {
        matches!(self, Self::Paragraph(_))
    }

    fn render(&self) -> Option<String> {
        let (tag, text) = match self {
            Self::Section(text) => ("h2", text),
            Self::Subsection(text) => ("h3", text),
            Self::Paragraph(text) => ("text", text),
        };
        (!text.is_empty()).then(|| format!("<{tag}>{text}</{tag}>"))
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector is valid")
}
