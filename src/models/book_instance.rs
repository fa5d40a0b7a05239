use super::{Book, FieldError, TEXT_MAX_LEN, Text};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Circulation state of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Available,
    Maintenance,
    Loaned,
    Reserved,
}

impl LoanStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Maintenance => "maintenance",
            Self::Loaned => "loaned",
            Self::Reserved => "reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "maintenance" => Ok(Self::Maintenance),
            "loaned" => Ok(Self::Loaned),
            "reserved" => Ok(Self::Reserved),
            other => Err(FieldError::new(
                "status",
                format!("\"{other}\" is not a known status"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInstanceFields {
    book_id: i64,
    imprint: Text,
    status: LoanStatus,
    due_back: Option<NaiveDate>,
}

impl BookInstanceFields {
    /// A loaned copy must say when it is due back.
    pub fn new(
        book_id: i64,
        imprint: &str,
        status: LoanStatus,
        due_back: Option<NaiveDate>,
    ) -> Result<Self, FieldError> {
        let imprint = Text::new("imprint", imprint, TEXT_MAX_LEN)?;
        if status == LoanStatus::Loaned && due_back.is_none() {
            return Err(FieldError::new(
                "due_back",
                "is required when status is \"loaned\"",
            ));
        }
        Ok(Self {
            book_id,
            imprint,
            status,
            due_back,
        })
    }

    pub const fn book_id(&self) -> i64 {
        self.book_id
    }

    pub const fn imprint(&self) -> &Text {
        &self.imprint
    }

    pub const fn status(&self) -> LoanStatus {
        self.status
    }

    pub const fn due_back(&self) -> Option<NaiveDate> {
        self.due_back
    }
}

/// A physical copy with its book resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInstance {
    id: i64,
    book: Book,
    imprint: Text,
    status: LoanStatus,
    due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub const fn new(
        id: i64,
        book: Book,
        imprint: Text,
        status: LoanStatus,
        due_back: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            book,
            imprint,
            status,
            due_back,
        }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn book(&self) -> &Book {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut Book {
        &mut self.book
    }

    pub const fn imprint(&self) -> &Text {
        &self.imprint
    }

    pub const fn status(&self) -> LoanStatus {
        self.status
    }

    pub const fn due_back(&self) -> Option<NaiveDate> {
        self.due_back
    }
}
