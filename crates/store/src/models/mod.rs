mod book;
mod entity;
mod letter;

pub(crate) use self::book::BookRow;
pub use self::book::BookRecord;
pub(crate) use self::entity::EntityRow;
pub use self::entity::{Author, Series, Tag};
pub(crate) use self::letter::LetterRow;
pub use self::letter::LetterCount;

/// Primary key of any row in the library database.
pub type Id = i64;
