//! A fetched page and the element lookups extraction needs.
//!
//! This is the "find / text / attribute" half of the page-source capability.
//! Lookups that must succeed return [`CardtrackError::Extraction`] so a
//! missing element aborts the run instead of producing a hollow row.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use cardtrack_shared::{CardtrackError, Result};

/// A parsed HTML document together with the URL it was fetched from.
pub struct Page {
    url: Url,
    doc: Html,
}

impl Page {
    /// Parse `html` as the document found at `url`.
    pub fn parse(url: Url, html: &str) -> Self {
        Self {
            url,
            doc: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching `css`, in document order.
    pub fn find(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let sel = selector(css)?;
        Ok(self.doc.select(&sel).collect())
    }

    /// First element matching `css`.
    pub fn find_one(&self, css: &str) -> Result<ElementRef<'_>> {
        let sel = selector(css)?;
        self.doc.select(&sel).next().ok_or_else(|| {
            CardtrackError::extraction(format!("no element matches '{css}' on {}", self.url))
        })
    }

    /// Resolve an `href`-like attribute of `el` against the page URL.
    pub fn link(&self, el: ElementRef<'_>, attr: &str) -> Result<Url> {
        let raw = attribute(el, attr).ok_or_else(|| {
            CardtrackError::extraction(format!("<{}> has no {attr} attribute", el.value().name()))
        })?;
        self.url
            .join(&raw)
            .map_err(|e| CardtrackError::extraction(format!("bad {attr} '{raw}': {e}")))
    }
}

/// Descendants of `el` matching `css`.
pub fn find_in<'a>(el: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(el.select(&sel).collect())
}

/// First descendant of `el` matching `css`.
pub fn find_one_in<'a>(el: ElementRef<'a>, css: &str) -> Result<ElementRef<'a>> {
    let sel = selector(css)?;
    el.select(&sel).next().ok_or_else(|| {
        CardtrackError::extraction(format!(
            "no element matches '{css}' inside {}",
            describe(el)
        ))
    })
}

/// Visible text of `el` with runs of whitespace collapsed.
pub fn text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw attribute value of `el`.
pub fn attribute(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(str::to_string)
}

/// Short description of an element for error messages (`<tr id="productRow12">`).
pub fn describe(el: ElementRef<'_>) -> String {
    match el.value().id() {
        Some(id) => format!("<{} id=\"{id}\">", el.value().name()),
        None => format!("<{}>", el.value().name()),
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| CardtrackError::extraction(format!("invalid selector '{css}': {e:?}")))
}
