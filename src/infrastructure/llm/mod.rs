mod hosted;
mod openai_compatible;
mod sse;

pub use hosted::RigLlm;
pub use openai_compatible::OpenAiCompatibleLlm;

use crate::domain::ports::CompletionRequest;

/// Folds prior turns into a single prompt for providers that take one message.
pub(crate) fn flatten_history(request: &CompletionRequest) -> String {
    if request.history.is_empty() {
        return request.prompt.clone();
    }

    let transcript = request
        .history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Previous conversation:\n{}\n\n{}",
        transcript, request.prompt
    )
}
