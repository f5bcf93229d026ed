// src/services/extract.rs

//! Event extraction from the calendar page.
//!
//! The selection rule works on attributes only, so it does not care how
//! deeply the event containers are nested or what tags they use. Walking the
//! tree goes through [`MarkupNode`], which keeps the rule testable against
//! hand-built trees.

use std::borrow::Cow;

use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::models::{Event, ExtractConfig};
use crate::services::normalize::normalize;

/// Length of the `YYYYMMDD` suffix.
const DATE_SUFFIX_LEN: usize = 8;

/// Minimal view of an element tree.
pub trait MarkupNode: Sized {
    /// Attribute value by name.
    fn attr(&self, name: &str) -> Option<&str>;

    /// Child elements in document order.
    fn child_elements(&self) -> Vec<Self>;

    /// All descendant text in document order.
    fn text_content(&self) -> String;
}

impl<'a> MarkupNode for ElementRef<'a> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }
}

/// Extracts `(date, description)` records from calendar markup.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    config: ExtractConfig,
}

impl EventExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Parse raw page bytes and extract all events in document order.
    ///
    /// Invalid UTF-8 sequences become U+FFFD and the HTML parser recovers
    /// from any markup error, so every page yields a tree.
    pub fn extract(&self, body: &[u8]) -> Vec<Event> {
        let html = String::from_utf8_lossy(body);
        if let Cow::Owned(_) = html {
            log::warn!("Page is not valid UTF-8; invalid bytes were replaced");
        }
        let document = Html::parse_document(&html);

        let events = self.extract_from(document.root_element());
        log::debug!("Extracted {} events from {} bytes", events.len(), body.len());
        events
    }

    /// Walk the tree under `root` depth-first and collect every event.
    pub fn extract_from<N: MarkupNode>(&self, root: N) -> Vec<Event> {
        let mut events = Vec::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if let Some(event) = self.event_from(&node) {
                events.push(event);
            }

            let mut children = node.child_elements();
            children.reverse();
            stack.extend(children);
        }

        events
    }

    /// Build an event if `node` is a qualifying container.
    fn event_from<N: MarkupNode>(&self, node: &N) -> Option<Event> {
        if node.attr(&self.config.marker_attr)? != self.config.marker_value {
            return None;
        }
        let date = self.date_from_id(node.attr(&self.config.id_attr)?)?;

        let description = normalize(&node.text_content());
        if description.is_empty() {
            return None;
        }

        Some(Event::new(date, description))
    }

    /// Parse the trailing `YYYYMMDD` segment of an identifier.
    fn date_from_id(&self, id: &str) -> Option<NaiveDate> {
        let (_, suffix) = id.rsplit_once(self.config.id_delimiter.as_str())?;
        if suffix.len() != DATE_SUFFIX_LEN || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(suffix, "%Y%m%d").ok()
    }
}

impl Default for EventExtractor {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}
