/// Connection ids are handed out by the hub. Zero is never assigned; on the wire it means
/// "the connection this frame arrived on".
pub type ClientId = u64;

/// Database row ids share one shape: a transparent i64 that maps straight onto an
/// `INTEGER PRIMARY KEY` column.
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Copy,
            Clone,
            Debug,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            sqlx::Type,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[repr(transparent)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[inline]
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

define_id!(UserId);
define_id!(PlayerId);
