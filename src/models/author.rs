use super::{FieldError, PERSON_NAME_MAX_LEN, Text};
use chrono::NaiveDate;

/// Everything an author row stores apart from its id.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorFields {
    first_name: Text,
    last_name: Text,
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
}

impl AuthorFields {
    pub fn new(
        first_name: &str,
        last_name: &str,
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> Result<Self, FieldError> {
        let first_name = Text::new("first_name", first_name, PERSON_NAME_MAX_LEN)?;
        let last_name = Text::new("last_name", last_name, PERSON_NAME_MAX_LEN)?;
        if let (Some(born), Some(died)) = (date_of_birth, date_of_death) {
            if died < born {
                return Err(FieldError::new(
                    "date_of_death",
                    "must not precede date_of_birth",
                ));
            }
        }
        Ok(Self {
            first_name,
            last_name,
            date_of_birth,
            date_of_death,
        })
    }

    pub(crate) const fn new_unchecked(
        first_name: Text,
        last_name: Text,
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> Self {
        Self {
            first_name,
            last_name,
            date_of_birth,
            date_of_death,
        }
    }

    pub const fn first_name(&self) -> &Text {
        &self.first_name
    }

    pub const fn last_name(&self) -> &Text {
        &self.last_name
    }

    pub const fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub const fn date_of_death(&self) -> Option<NaiveDate> {
        self.date_of_death
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    id: i64,
    fields: AuthorFields,
}

impl Author {
    pub const fn new(id: i64, fields: AuthorFields) -> Self {
        Self { id, fields }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn fields(&self) -> &AuthorFields {
        &self.fields
    }

    pub const fn first_name(&self) -> &Text {
        &self.fields.first_name
    }

    pub const fn last_name(&self) -> &Text {
        &self.fields.last_name
    }

    pub const fn date_of_birth(&self) -> Option<NaiveDate> {
        self.fields.date_of_birth
    }

    pub const fn date_of_death(&self) -> Option<NaiveDate> {
        self.fields.date_of_death
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_author_without_dates() {
        let fields = AuthorFields::new("Leo", "Tolstoy", None, None).unwrap();
        assert_eq!(fields.first_name().as_str(), "Leo");
        assert_eq!(fields.last_name().as_str(), "Tolstoy");
        assert_eq!(fields.date_of_birth(), None);
    }

    #[test]
    fn death_may_not_precede_birth() {
        let err = AuthorFields::new(
            "Leo",
            "Tolstoy",
            Some(date(1828, 9, 9)),
            Some(date(1810, 11, 20)),
        )
        .unwrap_err();
        assert_eq!(err.field(), "date_of_death");
    }

    #[test]
    fn death_alone_is_accepted() {
        let fields = AuthorFields::new("Anonymous", "Scribe", None, Some(date(1200, 1, 1)));
        assert!(fields.is_ok());
    }

    #[test]
    fn empty_last_name_is_rejected() {
        let err = AuthorFields::new("Leo", " ", None, None).unwrap_err();
        assert_eq!(err.field(), "last_name");
    }
}
