use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};

#[derive(sqlx::FromRow)]
pub(crate) struct LetterRow {
    letter: String,
    count: i64,
}

/// Number of books whose normalized sort key starts with `letter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterCount {
    pub letter: char,
    pub count: u64,
}
impl TryFrom<LetterRow> for LetterCount {
    type Error = Error;
    fn try_from(row: LetterRow) -> Result<Self, Self::Error> {
        Ok(Self {
            letter: row.letter.chars().next().ok_or_raise(|| ErrorKind::InvalidData("sort key"))?,
            count: u64::try_from(row.count).or_raise(|| ErrorKind::InvalidData("book count"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_model() {
        let row = LetterRow { letter: "É".to_string(), count: 3 };
        assert_eq!(LetterCount::try_from(row).unwrap(), LetterCount { letter: 'É', count: 3 });
    }

    #[test]
    fn test_empty_sort_key_is_invalid() {
        let row = LetterRow { letter: String::new(), count: 1 };
        assert!(LetterCount::try_from(row).is_err());
    }
}
