//! Drives one generation session for the terminal: streams output as it
//! arrives and offers a retry when an attempt fails.

use std::io::{self, Write};

use tokio::sync::watch;

use crate::core::error::GenerationError;
use crate::core::generation::{GenerationController, GenerationState};
use crate::core::prompts::Task;
use crate::ui::markdown::render_markdown;
use crate::ui::stream_printer::StreamPrinter;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub task: Task,
    /// Print a markdown result view at the end instead of streaming raw text.
    pub markdown: bool,
}

/// Runs `input` through `controller` until an attempt succeeds, or fails and
/// `should_retry` declines another attempt. Returns the final state.
pub async fn run_session<W: Write>(
    controller: &mut GenerationController,
    input: &str,
    options: &SessionOptions,
    out: &mut W,
    mut should_retry: impl FnMut(&GenerationError) -> bool,
) -> io::Result<GenerationState> {
    let mut printer = StreamPrinter::new();
    let mut rx = controller.start(input);

    loop {
        let state = wait_for_terminal(&mut rx, &mut printer, out, !options.markdown).await?;
        if !options.markdown {
            printer.finish(out)?;
        }

        let retry = match &state.error {
            Some(GenerationError::EmptyInput) | None => false,
            Some(error) => should_retry(error),
        };
        if retry {
            controller.retry();
            continue;
        }

        if options.markdown {
            out.write_all(render_markdown(&options.task, input, &state).as_bytes())?;
            out.flush()?;
        }
        return Ok(state);
    }
}

async fn wait_for_terminal<W: Write>(
    rx: &mut watch::Receiver<GenerationState>,
    printer: &mut StreamPrinter,
    out: &mut W,
    stream_text: bool,
) -> io::Result<GenerationState> {
    loop {
        let state = rx.borrow_and_update().clone();
        if stream_text {
            printer.update(&state, out)?;
        }
        if state.is_terminal() {
            return Ok(state);
        }
        if rx.changed().await.is_err() {
            return Ok(rx.borrow().clone());
        }
    }
}
