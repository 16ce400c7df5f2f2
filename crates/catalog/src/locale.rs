//! Localized catalog strings.
//!
//! Entry titles and link labels are looked up by key with positional
//! arguments. The default [`Messages`] catalog holds English [upon]
//! templates where `{{ args.0 }}`, `{{ args.1 }}` refer to the arguments in
//! order.

use std::collections::HashMap;
use upon::{Engine, Template, Value};

/// Message keys used by the catalog.
pub mod keys {
    pub const SERIES: &str = "content.series";
    pub const SERIES_DATA: &str = "content.series.data";
    pub const BOOK_AUTHOR: &str = "bookentry.author";
    pub const OTHER_BOOKS: &str = "splitByLetter.book.other";
    pub const ALL_BOOKS_TITLE: &str = "allbooks.title";
    pub const ALL_BOOKS_ALPHABETICAL: &str = "allbooks.alphabetical";
    pub const RECENT_TITLE: &str = "recent.title";
    pub const RECENT_LIST: &str = "recent.list";
    pub const BOOK_COUNT: &str = "bookword.many";
}

/// Something that can turn a message key and its arguments into text.
pub trait Localize: Send + Sync {
    /// Renders `key` with positional `args`. Unknown keys render as the key.
    fn message(&self, key: &str, args: &[&str]) -> String;
}

const ENGLISH: &[(&str, &str)] = &[
    (keys::SERIES, "Series: "),
    (keys::SERIES_DATA, "Book {{ args.0 }} in the {{ args.1 }} series"),
    (keys::BOOK_AUTHOR, "{{ args.0 }} by {{ args.1 }}"),
    (keys::OTHER_BOOKS, "Other books"),
    (keys::ALL_BOOKS_TITLE, "All books"),
    (keys::ALL_BOOKS_ALPHABETICAL, "Alphabetical index of the {{ args.0 }} books"),
    (keys::RECENT_TITLE, "Recent additions"),
    (keys::RECENT_LIST, "{{ args.0 }} most recent books"),
    (keys::BOOK_COUNT, "{{ args.0 }} books"),
];

/// Template-backed message catalog.
///
/// Templates are compiled once, up front. A template that fails to compile
/// is left out (and logged), so its key falls back to rendering as itself.
pub struct Messages {
    engine: Engine<'static>,
    templates: HashMap<String, Template<'static>>,
}

impl Default for Messages {
    fn default() -> Self {
        Self::from_templates(ENGLISH.iter().copied())
    }
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys = self.templates.keys().collect::<Vec<_>>();
        keys.sort();
        f.debug_struct("Messages").field("keys", &keys).finish()
    }
}

impl Messages {
    /// Builds a catalog from `(key, template)` pairs.
    pub fn from_templates<K, S>(templates: impl IntoIterator<Item = (K, S)>) -> Self
    where
        K: Into<String>,
        S: Into<String>,
    {
        let engine = Engine::new();
        let templates = templates
            .into_iter()
            .filter_map(|(key, source)| {
                let key = key.into();
                match engine.compile(source.into()) {
                    Ok(template) => Some((key, template)),
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "discarding invalid message template");
                        None
                    },
                }
            })
            .collect();
        Self { engine, templates }
    }

    /// Replaces or adds a single template.
    pub fn with_template(mut self, key: impl Into<String>, source: impl Into<String>) -> Self {
        let key = key.into();
        match self.engine.compile(source.into()) {
            Ok(template) => {
                self.templates.insert(key, template);
            },
            Err(err) => tracing::warn!(key = %key, error = %err, "discarding invalid message template"),
        }
        self
    }
}

impl Localize for Messages {
    fn message(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.templates.get(key) else {
            return key.to_string();
        };
        let args = Value::List(args.iter().map(|arg| Value::String(arg.to_string())).collect());
        match template.render(&self.engine, upon::value! { args: args }).to_string() {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to render message");
                key.to_string()
            },
        }
    }
}
