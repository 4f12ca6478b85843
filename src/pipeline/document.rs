use scraper::{ElementRef, Html, Selector};

/// A parsed HTML page. Read-only once built.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// First element matching `selector`, or an empty match.
    ///
    /// An unparsable selector is logged and treated as no match.
    pub fn find(&self, selector: &str) -> Element<'_> {
        let element = compile(selector).and_then(|sel| self.html.select(&sel).next());
        trace_lookup(selector, element.is_some());
        Element { inner: element }
    }
}

/// Zero or one element from a selector lookup.
#[derive(Clone, Copy)]
pub struct Element<'a> {
    inner: Option<ElementRef<'a>>,
}

impl<'a> Element<'a> {
    pub fn is_match(&self) -> bool {
        self.inner.is_some()
    }

    /// First descendant matching `selector`.
    pub fn find(&self, selector: &str) -> Element<'a> {
        let element = self
            .inner
            .zip(compile(selector))
            .and_then(|(el, sel)| el.select(&sel).next());
        trace_lookup(selector, element.is_some());
        Element { inner: element }
    }

    /// Text content, trimmed. `None` when there is no element or no text.
    pub fn text(&self) -> Option<String> {
        self.inner
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Attribute value as written. An empty value is still `Some("")`.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.inner
            .and_then(|el| el.value().attr(name))
            .map(str::to_string)
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::warn!(selector, error = %e, "Invalid selector");
            None
        }
    }
}

fn trace_lookup(selector: &str, found: bool) {
    if found {
        tracing::debug!(selector, "Found element for selector");
    } else {
        tracing::debug!(selector, "No elements found for selector");
    }
}
