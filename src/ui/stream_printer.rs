use std::io::{self, Write};

use crate::core::generation::GenerationState;

/// Writes only the not-yet-printed suffix of `accumulated_text` as states
/// arrive. A state whose text no longer extends what was printed (a retry
/// started over) begins a fresh block.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: String,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<W: Write>(&mut self, state: &GenerationState, out: &mut W) -> io::Result<()> {
        let text = state.accumulated_text.as_str();

        if !text.starts_with(self.printed.as_str()) {
            if !self.printed.is_empty() {
                out.write_all(b"\n")?;
            }
            self.printed.clear();
        }

        let suffix = &text[self.printed.len()..];
        if !suffix.is_empty() {
            out.write_all(suffix.as_bytes())?;
            out.flush()?;
            self.printed.push_str(suffix);
        }
        Ok(())
    }

    /// Ends the current block with a newline if anything was printed.
    pub fn finish<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if !self.printed.is_empty() && !self.printed.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        self.printed.clear();
        Ok(())
    }

    pub fn printed(&self) -> &str {
        &self.printed
    }
}
