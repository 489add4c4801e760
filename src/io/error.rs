//! # Error reporting for reading of certificate files
//!
//! A collection of enums and structures describing any problems encountered during reading and
//! parsing.
use core::fmt::Display;
use std::error::Error;
use std::fmt;
use std::io;

/// An `Import` error is created when an error was encountered during IO or parsing.
///
/// It is the highest error in the io error hierarchy.
#[derive(Debug)]
pub enum Import {
    /// The file to read isn't found, or the reading of file couldn't start or was interrupted.
    IO(io::Error),
    /// Contents of the file could not be parsed into a certificate.
    ///
    /// # Note
    ///
    /// An unsound derivation is not represented with this error. This variant should only be
    /// created for syntactically incorrect files, unsupported format versions and indices which
    /// are out of range at the moment they are read.
    Parse(Parse),
}

impl Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Import::IO(error) => error.fmt(f),
            Import::Parse(error) => error.fmt(f),
        }
    }
}

impl Error for Import {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Import::IO(error) => error.source(),
            Import::Parse(error) => error.source(),
        }
    }
}

/// A `Parse` error represents all errors encountered during parsing.
///
/// It may recursively hold more parse errors to provide more detail. At the end of this chain,
/// there may be a file location containing a line number and the offending token.
#[derive(Debug, Eq, PartialEq)]
pub struct Parse {
    description: String,
    source: Option<ParseErrorSource>,
}

impl Display for Parse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ParseError: {}", self.description)?;
        if let Some(ParseErrorSource::FileLocation(line_number, token)) = &self.source {
            writeln!(f, "\tCaused at line\t{}:\t{}", line_number, token)?;
        }
        Ok(())
    }
}

impl Error for Parse {
    /// Find out what caused this error.
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Some(ParseErrorSource::Nested(error)) = &self.source {
            Some(error)
        } else {
            None
        }
    }
}

impl Parse {
    /// Create a new `Parse` error with only a description.
    ///
    /// # Arguments
    ///
    /// * `description`: What's wrong at the moment of creation.
    pub fn new(description: impl Into<String>) -> Parse {
        Parse { description: description.into(), source: None }
    }

    /// Create a new `Parse` error instance with a `FileLocation` as a cause.
    ///
    /// # Arguments
    ///
    /// * `description`: What's wrong at the moment of creation.
    /// * `file_location`: The line number and token that caused the error.
    pub fn with_location(description: impl Into<String>, file_location: FileLocation) -> Parse {
        let (line_number, token) = file_location;
        Parse {
            description: description.into(),
            source: Some(ParseErrorSource::FileLocation(line_number, token.to_string())),
        }
    }

    /// Wrap a new `Parse` error around an existing one.
    ///
    /// # Arguments
    ///
    /// * `description`: What's wrong at the moment of creation.
    /// * `parse_error`: What caused this error.
    pub fn with_cause(description: impl Into<String>, parse_error: Parse) -> Parse {
        Parse {
            description: description.into(),
            source: Some(ParseErrorSource::Nested(Box::new(parse_error))),
        }
    }
}

/// A cause to be held by a `Parse` error to describe its origin.
///
/// It can be either a file line number with the offending token, or another `Parse` error with
/// its own description and optionally, a cause.
#[derive(Debug, Eq, PartialEq)]
enum ParseErrorSource {
    FileLocation(u64, String),
    Nested(Box<Parse>),
}

/// A `FileLocation` references a token in the file by the line number of the file as originally
/// read from the disk.
pub type FileLocation<'a> = (u64, &'a str);
