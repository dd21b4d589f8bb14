use rand::Rng;
use rand::distributions::{Distribution, Uniform};
use std::fmt;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 6;

/// Short code the poster and helper exchange in person.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfirmationCode(String);

impl ConfirmationCode {
    /// Generates a random six-character uppercase alphanumeric code.
    #[must_use]
    pub fn generate(rng: &mut impl Rng) -> Self {
        let picker = Uniform::from(0..ALPHABET.len());
        let code = picker
            .sample_iter(rng)
            .take(CODE_LENGTH)
            .filter_map(|index| ALPHABET.get(index).copied().map(char::from))
            .collect();
        Self(code)
    }

    /// Wraps a stored code.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfirmationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
