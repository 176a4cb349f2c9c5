//! Identity-provider subject identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a subject identifier is blank or oversized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("subject id must be 1-{max} visible characters", max = SubjectId::MAX_LENGTH)]
pub struct InvalidSubjectId;

/// Opaque user id handed to us by the identity provider.
///
/// The service never validates credentials; it only trusts that whoever set
/// this value upstream authenticated the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Longest accepted subject id.
    pub const MAX_LENGTH: usize = 128;

    /// Validate a subject id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSubjectId`] if the value is empty, too long, or
    /// contains whitespace or control characters.
    pub fn parse(s: &str) -> Result<Self, InvalidSubjectId> {
        if s.is_empty()
            || s.len() > Self::MAX_LENGTH
            || s.chars().any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(InvalidSubjectId);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the subject id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = InvalidSubjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for SubjectId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SubjectId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for SubjectId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(SubjectId::parse("auth0|65f1c2").is_ok());
        assert_eq!(SubjectId::parse(""), Err(InvalidSubjectId));
        assert_eq!(SubjectId::parse("two words"), Err(InvalidSubjectId));
        assert_eq!(
            SubjectId::parse(&"x".repeat(SubjectId::MAX_LENGTH + 1)),
            Err(InvalidSubjectId)
        );
    }
}
