//! Read-only access to a Calibre library database.
//!
//! The library database is the source of truth for book metadata; this crate
//! never writes to it. It exposes:
//! - **Entity resolvers**: minimal `(id, name)` records for authors, series
//!   and tags, looked up by id or by owning book.
//! - **Book records**: the scalar projection of a book row. Associations are
//!   *not* joined in; callers resolve them lazily through the [`Store`].
//! - **Selectors**: one tagged variant per catalog filter, each bound to one
//!   SQL template with its own ordering rules.
//!
//! The [`Store`] trait is the seam between the catalog and the database. The
//! SQLite [`Repository`] implements it for real libraries; enable the `mock`
//! feature for a counting in-memory [`mock::MockStore`].

mod db;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
mod models;
mod repo;
mod selector;
mod store;

pub use crate::db::Database;
pub use crate::models::{Author, BookRecord, Id, LetterCount, Series, Tag};
pub use crate::repo::Repository;
pub use crate::selector::Selector;
pub use crate::store::Store;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn Store>;
