//! In-memory document store, the reference [`Handler`].

use crate::config::ConfigError;
use crate::handler::{Handler, HandlerError};
use gordon_protocol::{Metadata, Page, PageRef, Record, Request, Section, Verb};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Author stamped on pages the server synthesizes.
pub const SERVER_AUTHOR: &str = "Gordon";

/// Title of the synthesized index page.
pub const INDEX_TITLE: &str = "Page Index";

pub const PAGE_NOT_FOUND: &str = "Page Not Found";
pub const VERB_NOT_SUPPORTED: &str = "Verb Not Supported";

/// Pages keyed by id, read-only once serving starts.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    pages: BTreeMap<Uuid, Page>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from pages, keyed by `meta.id`. Later duplicates win.
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Self {
        let mut store = Self::new();
        for page in pages {
            store.insert(page);
        }
        store
    }

    /// Adds or replaces a page, returning the page it replaced.
    pub fn insert(&mut self, page: Page) -> Option<Page> {
        self.pages.insert(page.meta.id, page)
    }

    /// Loads a YAML list of pages.
    ///
    /// Every page is normalized and validated; the nil id is reserved for the
    /// index and rejected.
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Vec<Page>, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        parse_pages(&content)
            .map_err(|msg| ConfigError::ParseError(path.to_path_buf(), msg))
    }

    pub fn get(&self, id: &Uuid) -> Option<&Page> {
        self.pages.get(id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Document ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &Uuid> {
        self.pages.keys()
    }

    /// Lists every document, in id order.
    pub fn index_page(&self) -> Page {
        let mut page = Page::new(Metadata::now(Uuid::nil(), SERVER_AUTHOR), INDEX_TITLE);
        page.tags.push("index".to_string());

        for (id, doc) in &self.pages {
            page.sections
                .push(Section::new(id.to_string(), summary(doc)));
            page.links.push(PageRef::to_page(*id));
        }
        page
    }

    fn read(&self, id: Uuid) -> Page {
        if id.is_nil() {
            return self.index_page();
        }
        match self.pages.get(&id) {
            Some(page) => page.clone(),
            None => error_page(id, PAGE_NOT_FOUND),
        }
    }
}

impl Handler for DocumentStore {
    fn serve(&self, request: &Request) -> Result<Option<Page>, HandlerError> {
        let page = match request.verb {
            Verb::Read => self.read(request.id),
            _ => error_page(request.id, VERB_NOT_SUPPORTED),
        };
        Ok(Some(page))
    }
}

/// An error-status page about the document `id`.
pub fn error_page(id: Uuid, message: &str) -> Page {
    Page::error(Metadata::now(id, SERVER_AUTHOR), message)
}

/// One-paragraph description of a page, used on the index.
pub fn summary(page: &Page) -> String {
    format!(
        "{}\n\nPublished Last by {} ({})\n",
        page.preamble,
        page.meta.author,
        page.meta.published.to_rfc3339()
    )
}

fn parse_pages(content: &str) -> Result<Vec<Page>, String> {
    let pages: Vec<Page> = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    pages
        .into_iter()
        .enumerate()
        .map(|(i, mut page)| {
            if page.meta.id.is_nil() {
                return Err(format!("page {} has no id", i));
            }
            page.transform().map_err(|e| format!("page {}: {}", i, e))?;
            page.validate()
                .map_err(|e| format!("page {} ({}): {}", i, page.meta.id, e))?;
            if !page.status.is_valid() {
                return Err(format!("page {} ({}) has no status", i, page.meta.id));
            }
            Ok(page)
        })
        .collect()
}
