//! # Reading and writing of certificates
//!
//! This module provides read and write functionality for the certificate format.
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::data::certificate::Certificate;
use crate::io::error::Import;
use crate::io::vipr::writing::LineEnding;

pub mod error;
pub mod vipr;

/// Import a certificate from a file.
///
/// The line ending style of the file is returned alongside so that it can be reproduced when a
/// completed version of the certificate is written back out.
///
/// # Errors
///
/// When the file cannot be found or read, or when its contents are not a syntactically valid
/// certificate of a supported version.
pub fn import(file_path: &Path) -> Result<(Certificate, LineEnding), Import> {
    let mut text = String::new();
    File::open(file_path)
        .map_err(Import::IO)?
        .read_to_string(&mut text)
        .map_err(Import::IO)?;

    let line_ending = LineEnding::detect(&text);
    let certificate = vipr::parsing::parse(&text).map_err(Import::Parse)?;

    Ok((certificate, line_ending))
}

/// Write a certificate to a file.
pub fn export(
    file_path: &Path,
    certificate: &Certificate,
    line_ending: LineEnding,
) -> Result<(), Import> {
    let file = File::create(file_path).map_err(Import::IO)?;
    let mut writer = BufWriter::new(file);
    vipr::writing::write(certificate, line_ending, &mut writer).map_err(Import::IO)?;
    writer.flush().map_err(Import::IO)
}
