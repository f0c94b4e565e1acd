use crate::api::ChatMessage;

/// What the model is asked to do with the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Translate { target_language: String },
    Summarize,
}

impl Task {
    pub fn translate(target_language: impl Into<String>) -> Self {
        Task::Translate {
            target_language: target_language.into(),
        }
    }

    pub fn system_prompt(&self) -> String {
        match self {
            Task::Translate { target_language } => format!(
                "You are a translator. Translate the input text into {target_language}. \
Output only the translation, with no explanations."
            ),
            Task::Summarize => "You are a summarizer. Summarize the input text concisely, \
in the same language as the input. Output only the summary."
                .to_string(),
        }
    }

    /// Heading used by the result view.
    pub fn title(&self) -> String {
        match self {
            Task::Translate { target_language } => format!("Translation ({target_language})"),
            Task::Summarize => "Summary".to_string(),
        }
    }
}

pub fn build_messages(system_prompt: &str, user_input: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(system_prompt), ChatMessage::user(user_input)]
}
