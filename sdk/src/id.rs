//! Fixed-width binary identities rendered as base58.
//!
//! Node ids, stream ids, and root piece ids all share the same byte-array
//! machinery but must never be confused for one another, so
//! `declare_byte_id!` stamps out a distinct newtype per identity.

use std::error;
use std::fmt;

/// Why a base58 string failed to parse into an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    WrongSize,
    Invalid,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseIdError: {:?}", self)
    }
}

impl error::Error for ParseIdError {}

/// Declares an identity newtype over `[u8; $len]` with base58
/// `Debug`/`Display`/`FromStr` and a `new_rand` test constructor.
#[macro_export]
macro_rules! declare_byte_id {
    ($(#[$attr:meta])* $name:ident, $len:literal) => {
        $(#[$attr])*
        #[repr(transparent)]
        #[derive(
            Serialize, Deserialize, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash,
        )]
        pub struct $name([u8; $len]);

        impl $name {
            pub const SIZE: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn new_rand() -> Self {
                Self($crate::rand::random())
            }

            pub fn to_bytes(self) -> [u8; $len] {
                self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::id::ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = $crate::bs58::decode(s)
                    .into_vec()
                    .map_err(|_| $crate::id::ParseIdError::Invalid)?;
                <[u8; $len]>::try_from(bytes.as_slice())
                    .map(Self)
                    .map_err(|_| $crate::id::ParseIdError::WrongSize)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", $crate::bs58::encode(&self.0).into_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", $crate::bs58::encode(&self.0).into_string())
            }
        }
    };
}
