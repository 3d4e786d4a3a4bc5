//! Program-image parsing.
//!
//! User programs arrive as text: whitespace-separated two-character hex
//! tokens, case-insensitive (`"A9 05 8D 10 00"`). This module validates and
//! parses that format, and renders byte images back into it for swap files.

use thiserror::Error;

/// Program-image validation failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    /// A token is not exactly two hex characters.
    #[error("invalid program token {0:?}: expected two hex characters")]
    InvalidToken(String),

    /// The source contains no tokens at all.
    #[error("program source is empty")]
    Empty,
}

/// Parses a hex program image into bytes.
///
/// # Examples
///
/// ```
/// use osim_core::sim::loader::parse_program;
///
/// assert_eq!(parse_program("A9 05 8d 10 00").unwrap(), vec![0xA9, 0x05, 0x8D, 0x10, 0x00]);
/// assert!(parse_program("A9 5").is_err());
/// ```
pub fn parse_program(source: &str) -> Result<Vec<u8>, LoadError> {
    let mut bytes = Vec::new();
    for token in source.split_whitespace() {
        if token.len() != 2 {
            return Err(LoadError::InvalidToken(token.to_string()));
        }
        let byte = u8::from_str_radix(token, 16)
            .map_err(|_| LoadError::InvalidToken(token.to_string()))?;
        bytes.push(byte);
    }
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    Ok(bytes)
}

/// Renders a byte image as space-separated uppercase hex tokens.
///
/// This is the swap-file format: `format_program` and [`parse_program`] are
/// inverses for any byte sequence.
pub fn format_program(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
