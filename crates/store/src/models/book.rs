use crate::error::{Error, ErrorKind};
use crate::models::Id;
use exn::OptionExt;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Calibre's sentinel for "no publication date" is 0101-01-01.
const UNDEFINED_YEAR: i32 = 101;

/// Raw projection shared by every book query (see `queries/books_*.sql`).
#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    id: Id,
    title: String,
    comment: Option<String>,
    path: String,
    timestamp: Option<String>,
    pubdate: Option<String>,
    series_index: f64,
    uuid: Option<String>,
}

/// Scalar data of one book, exactly as stored in the library.
///
/// Associations (authors, series, tags) are deliberately absent: they are
/// resolved on demand by whoever holds the record.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    /// Internal join key. Never expose this as the only public identifier.
    pub id: Id,
    /// Externally stable identity.
    pub uuid: String,
    pub title: String,
    /// When the book was added to the library.
    pub timestamp: OffsetDateTime,
    /// Publication date, if the library knows it.
    pub pubdate: Option<OffsetDateTime>,
    /// Position within its series (may be fractional, e.g. `2.5`).
    pub series_index: f64,
    /// Free-text or HTML description.
    pub comment: Option<String>,
    /// Book directory, relative to the library root.
    pub relative_path: PathBuf,
}
impl BookRecord {
    pub fn new(id: Id, uuid: impl Into<String>, title: impl Into<String>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            uuid: uuid.into(),
            title: title.into(),
            timestamp: OffsetDateTime::UNIX_EPOCH,
            pubdate: None,
            series_index: 1.0,
            comment: None,
            relative_path: relative_path.into(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_series_index(mut self, index: f64) -> Self {
        self.series_index = index;
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_pubdate(mut self, pubdate: OffsetDateTime) -> Self {
        self.pubdate = Some(pubdate);
        self
    }
}
impl TryFrom<BookRow> for BookRecord {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let timestamp = row.timestamp.ok_or_raise(|| ErrorKind::InvalidData("timestamp"))?;
        let pubdate = row
            .pubdate
            .map(|p| parse_datetime(&p).ok_or_raise(|| ErrorKind::InvalidData("pubdate")))
            .transpose()?
            .filter(|p| p.year() > UNDEFINED_YEAR);
        Ok(Self {
            id: row.id,
            uuid: row.uuid.filter(|u| !u.is_empty()).ok_or_raise(|| ErrorKind::InvalidData("uuid"))?,
            title: row.title,
            timestamp: parse_datetime(&timestamp).ok_or_raise(|| ErrorKind::InvalidData("timestamp"))?,
            pubdate,
            series_index: row.series_index,
            comment: row.comment,
            relative_path: PathBuf::from(row.path),
        })
    }
}

/// Calibre writes `2012-05-03 12:34:56.123456+00:00`; older libraries may
/// omit the offset, in which case UTC is assumed.
fn parse_datetime(value: &str) -> Option<OffsetDateTime> {
    let normalized = value.trim().replacen(' ', "T", 1);
    OffsetDateTime::parse(&normalized, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&format!("{normalized}Z"), &Rfc3339))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn row() -> BookRow {
        BookRow {
            id: 5,
            title: "Foundation".to_string(),
            comment: None,
            path: "Isaac Asimov/Foundation (5)".to_string(),
            timestamp: Some("2022-05-01 12:00:00+00:00".to_string()),
            pubdate: Some("1951-06-01 00:00:00+00:00".to_string()),
            series_index: 1.0,
            uuid: Some("6a1c5e1e-0c55-4d2b-9b57-1f1a7c6b0005".to_string()),
        }
    }

    #[test]
    fn test_row_to_model() {
        let book = BookRecord::try_from(row()).unwrap();
        assert_eq!(book.timestamp, datetime!(2022-05-01 12:00:00 UTC));
        assert_eq!(book.pubdate, Some(datetime!(1951-06-01 00:00:00 UTC)));
        assert_eq!(book.relative_path, PathBuf::from("Isaac Asimov/Foundation (5)"));
    }

    #[rstest]
    #[case("2022-05-01 12:00:00+00:00", datetime!(2022-05-01 12:00:00 UTC))]
    #[case("2022-05-01T12:00:00Z", datetime!(2022-05-01 12:00:00 UTC))]
    #[case("2022-05-01 12:00:00.250000+00:00", datetime!(2022-05-01 12:00:00.25 UTC))]
    #[case("2022-05-01 14:00:00+02:00", datetime!(2022-05-01 12:00:00 UTC))]
    #[case("2022-05-01 12:00:00", datetime!(2022-05-01 12:00:00 UTC))]
    fn test_parse_datetime(#[case] value: &str, #[case] expected: OffsetDateTime) {
        assert_eq!(parse_datetime(value), Some(expected));
    }

    #[test]
    fn test_undefined_pubdate_is_absent() {
        let row = BookRow { pubdate: Some("0101-01-01 00:00:00+00:00".to_string()), ..row() };
        assert_eq!(BookRecord::try_from(row).unwrap().pubdate, None);
    }

    #[test]
    fn test_missing_uuid_is_invalid() {
        assert!(BookRecord::try_from(BookRow { uuid: None, ..row() }).is_err());
        assert!(BookRecord::try_from(BookRow { uuid: Some(String::new()), ..row() }).is_err());
    }

    #[test]
    fn test_garbage_timestamp_is_invalid() {
        let row = BookRow { timestamp: Some("yesterday".to_string()), ..row() };
        assert!(BookRecord::try_from(row).is_err());
    }
}
