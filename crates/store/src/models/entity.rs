use crate::models::Id;

/// Minimal identity of the library's named entities: authors, series and
/// tags all share the same `(id, name)` projection.
#[derive(sqlx::FromRow)]
pub(crate) struct EntityRow {
    pub(crate) id: Id,
    pub(crate) name: String,
}

/// A person credited on one or more books.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Author {
    pub id: Id,
    pub name: String,
}
impl From<EntityRow> for Author {
    fn from(row: EntityRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}

/// A named sequence of books. A book belongs to at most one series, its
/// position is carried by the book itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Series {
    pub id: Id,
    pub name: String,
}
impl From<EntityRow> for Series {
    fn from(row: EntityRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}

/// A free-form label, many-to-many with books.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: Id,
    pub name: String,
}
impl From<EntityRow> for Tag {
    fn from(row: EntityRow) -> Self {
        Self { id: row.id, name: row.name }
    }
}
