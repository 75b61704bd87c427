//! Physical loyalty card number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TesseraFisica`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TesseraError {
    /// The card number is empty (after trimming).
    #[error("card number cannot be empty")]
    Empty,
    /// The card number is too long.
    #[error("card number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The card number contains something other than ASCII letters and digits.
    #[error("card number contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A physical loyalty card number ("tessera fisica").
///
/// The natural key of a fidelity record. Cards printed by the chain are
/// EAN-13 style digit strings, but older cards carry a letter prefix, so any
/// ASCII alphanumeric string up to 32 characters is accepted. Surrounding
/// whitespace is trimmed; the value is otherwise kept verbatim.
///
/// ```
/// use tessera_core::TesseraFisica;
///
/// let card = TesseraFisica::parse(" 2020000028284 ").unwrap();
/// assert_eq!(card.as_str(), "2020000028284");
/// assert!(TesseraFisica::parse("").is_err());
/// assert!(TesseraFisica::parse("2020-0000").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct TesseraFisica(String);

impl TesseraFisica {
    /// Maximum length of a card number.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a card number.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains a non-alphanumeric character.
    pub fn parse(s: &str) -> Result<Self, TesseraError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(TesseraError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(TesseraError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(TesseraError::InvalidCharacter(c));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the card number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TesseraFisica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TesseraFisica {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TesseraFisica {
    type Error = TesseraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TesseraFisica> for String {
    fn from(value: TesseraFisica) -> Self {
        value.0
    }
}

impl AsRef<str> for TesseraFisica {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
