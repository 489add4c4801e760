//! # The certificate file format
//!
//! Plain text, whitespace separated. A `%` at the start of a token introduces a comment running
//! to the end of the line; blank lines are insignificant. Sections appear in the fixed order
//! `VER`, `VAR`, `INT`, `OBJ`, `CON`, `RTP`, `SOL`, `DER`.
pub mod parsing;
pub mod token;
pub mod writing;

/// Supported major format version; other major versions are rejected.
pub const VERSION_MAJOR: u32 = 1;
/// Highest supported minor format version; the format is upward compatible within a major
/// version, so any lower minor version is accepted as well.
pub const VERSION_MINOR: u32 = 1;
