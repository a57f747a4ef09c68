use chrono::{DateTime, Utc};

use crate::index::Page;
use crate::model::{Entry, EntryDate};
use crate::sync::EntrySyncState;

pub mod config;
pub mod delete;
pub mod export;
pub mod import;
pub mod list;
pub mod prune;
pub mod save;
pub mod show;
pub mod status;
pub mod sync;

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One row in a listing: a date plus what the cache knows about it.
#[derive(Debug, Clone)]
pub struct EntryListing {
    pub date: EntryDate,
    pub state: EntrySyncState,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub entry: Option<Entry>,
    pub document: Option<String>,
    pub listings: Vec<EntryListing>,
    pub page: Option<Page>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_document(mut self, document: String) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_listings(mut self, listings: Vec<EntryListing>) -> Self {
        self.listings = listings;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}
