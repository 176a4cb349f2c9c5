//! Database ids for companies, members, projects and the rest.
//!
//! Every persisted entity gets its own ID type so a `ProjectId` can never be
//! passed where a `ClientId` is expected.

/// Declares an `i32` id newtype.
///
/// The generated type serializes as a bare number, parses from decimal text
/// (ignoring surrounding whitespace) and, with the `postgres` feature, binds
/// and decodes as an `INTEGER` column.
///
/// # Example
///
/// ```rust
/// # use tally_core::define_id;
/// define_id!(ShiftId);
/// define_id!(BadgeId);
///
/// let shift = ShiftId::new(1);
/// let parsed: ShiftId = " 1 ".parse().unwrap();
/// assert_eq!(shift, parsed);
///
/// // Mixing them up is a type error:
/// // let _: ShiftId = BadgeId::new(1);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Raw id, for logging and SQL binds.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(CompanyId);
define_id!(MemberId);
define_id!(ClientId);
define_id!(ProjectId);
define_id!(TimeEntryId);
define_id!(InviteId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id: ProjectId = "  42 ".parse().unwrap();
        assert_eq!(id, ProjectId::new(42));
    }

    #[test]
    fn test_parse_rejects_blank_and_garbage() {
        assert!("".parse::<ProjectId>().is_err());
        assert!("abc".parse::<ProjectId>().is_err());
        assert!("4.2".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&MemberId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: MemberId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_i32(), 7);
    }
}
