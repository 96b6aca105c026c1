//! Thin query layer over a parsed HTML page.
//!
//! Wraps `scraper` so the rest of the crate only sees "select by CSS,
//! read text, read attribute". Selector strings come from site profiles and
//! may be malformed; an unparsable selector simply matches nothing.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// A parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Document {
            html: Html::parse_document(source),
        }
    }

    /// Every element matching `css`, in document order.
    pub fn select(&self, css: &str) -> Vec<Element<'_>> {
        match compile(css) {
            Some(selector) => self.html.select(&selector).map(Element).collect(),
            None => Vec::new(),
        }
    }

    /// The `<html>` element, for queries scoped to the whole page.
    pub fn root(&self) -> Element<'_> {
        Element(self.html.root_element())
    }
}

/// Handle to one element of a [`Document`].
#[derive(Clone, Copy, Debug)]
pub struct Element<'a>(ElementRef<'a>);

impl<'a> Element<'a> {
    /// Visible text with runs of whitespace collapsed and the ends trimmed.
    pub fn text(&self) -> String {
        self.0
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// First descendant matching `css`.
    pub fn select_one(&self, css: &str) -> Option<Element<'a>> {
        let selector = compile(css)?;
        self.0.select(&selector).next().map(Element)
    }
}

fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(selector = css, error = %e, "Ignoring unparsable selector");
            None
        }
    }
}
