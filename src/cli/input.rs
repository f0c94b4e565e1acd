//! Input capture: positional arguments, or stdin when none are given.

use std::error::Error;
use std::fmt;
use std::io::Read;

#[derive(Debug)]
pub enum InputError {
    /// Nothing but whitespace was provided.
    NoText,
    Read(std::io::Error),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NoText => write!(
                f,
                "No text provided. Pass text as arguments or pipe it on stdin."
            ),
            InputError::Read(err) => write!(f, "Failed to read input: {err}"),
        }
    }
}

impl Error for InputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InputError::NoText => None,
            InputError::Read(err) => Some(err),
        }
    }
}

/// Joins `args` with spaces, or reads all of `stdin` when `args` is empty.
/// Surrounding whitespace is trimmed.
pub fn capture_input<R: Read>(args: &[String], mut stdin: R) -> Result<String, InputError> {
    let raw = if args.is_empty() {
        let mut buffer = String::new();
        stdin.read_to_string(&mut buffer).map_err(InputError::Read)?;
        buffer
    } else {
        args.join(" ")
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::NoText);
    }
    Ok(trimmed.to_string())
}
