use crate::core::generation::GenerationState;
use crate::core::prompts::Task;

const LOADING_NOTICE: &str = "_Generating…_";
const EMPTY_NOTICE: &str = "_The model returned no text._";

/// Renders the source text and the current generation state as a markdown
/// document: a fenced copy of the input, then the result, a loading notice,
/// or an error section that keeps any partial output.
pub fn render_markdown(task: &Task, input: &str, state: &GenerationState) -> String {
    let mut markdown = String::from("## Source text\n\n");
    push_fenced(&mut markdown, input);
    markdown.push_str("\n\n");

    if let Some(error) = &state.error {
        markdown.push_str("## Error\n\n");
        markdown.push_str(&error.to_string());
        if !state.accumulated_text.is_empty() {
            markdown.push_str("\n\n### Partial output\n\n");
            markdown.push_str(&state.accumulated_text);
        }
        markdown.push('\n');
        return markdown;
    }

    markdown.push_str(&format!("## {}\n\n", task.title()));
    match (state.accumulated_text.is_empty(), state.is_loading) {
        (true, true) => markdown.push_str(LOADING_NOTICE),
        (true, false) => markdown.push_str(EMPTY_NOTICE),
        (false, loading) => {
            markdown.push_str(&state.accumulated_text);
            if loading {
                markdown.push_str("\n\n");
                markdown.push_str(LOADING_NOTICE);
            }
        }
    }
    markdown.push('\n');
    markdown
}

/// Wraps `text` in a code fence longer than any backtick run it contains.
fn push_fenced(out: &mut String, text: &str) {
    let longest_run = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);

    out.push_str(&fence);
    out.push('\n');
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{GenerationError, TransportFailure};

    fn state(text: &str, is_loading: bool, error: Option<GenerationError>) -> GenerationState {
        GenerationState {
            accumulated_text: text.to_string(),
            is_loading,
            error,
        }
    }

    #[test]
    fn loading_without_text_shows_notice() {
        let rendered = render_markdown(
            &Task::translate("Japanese"),
            "Hello",
            &state("", true, None),
        );

        assert_eq!(
            rendered,
            "## Source text\n\n```\nHello\n```\n\n## Translation (Japanese)\n\n_Generating…_\n"
        );
    }

    #[test]
    fn finished_result_is_rendered_verbatim() {
        let rendered =
            render_markdown(&Task::Summarize, "Long text", &state("Short.", false, None));

        assert!(rendered.ends_with("## Summary\n\nShort.\n"));
        assert!(!rendered.contains(LOADING_NOTICE));
    }

    #[test]
    fn error_keeps_partial_output() {
        let error = GenerationError::Transport(TransportFailure::Network("reset".to_string()));
        let rendered =
            render_markdown(&Task::Summarize, "input", &state("hel", false, Some(error)));

        assert!(rendered.contains("## Error\n\nNetwork error: reset"));
        assert!(rendered.contains("### Partial output\n\nhel"));
        assert!(!rendered.contains("## Summary"));
    }

    #[test]
    fn input_with_backticks_gets_a_longer_fence() {
        let rendered = render_markdown(
            &Task::Summarize,
            "```rust\nfn main() {}\n```",
            &state("", false, None),
        );

        assert!(rendered.starts_with("## Source text\n\n````\n```rust"));
        assert!(rendered.contains("```\n````\n"));
        assert!(rendered.contains(EMPTY_NOTICE));
    }
}
