use super::{FieldError, TEXT_MAX_LEN, Text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreFields {
    name: Text,
}

impl GenreFields {
    pub fn new(name: &str) -> Result<Self, FieldError> {
        let name = Text::new("name", name, TEXT_MAX_LEN)?;
        Ok(Self { name })
    }

    pub(crate) const fn new_unchecked(name: Text) -> Self {
        Self { name }
    }

    pub const fn name(&self) -> &Text {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    id: i64,
    fields: GenreFields,
}

impl Genre {
    pub const fn new(id: i64, fields: GenreFields) -> Self {
        Self { id, fields }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn name(&self) -> &Text {
        &self.fields.name
    }
}
