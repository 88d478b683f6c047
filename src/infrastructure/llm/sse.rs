use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Delta(String),
    Done,
}

/// Parses one line of an OpenAI-style chat completion stream.
///
/// Keep-alives, comments, role-only deltas and the final `finish_reason`
/// chunk yield `None`.
pub fn parse_sse_line(line: &str) -> Result<Option<SseEvent>, DomainError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();

    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let json: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| DomainError::generation(format!("malformed stream chunk: {e}")))?;

    if let Some(error) = json.get("error") {
        let message = error["message"].as_str().unwrap_or("provider error");
        return Err(DomainError::generation(message.to_string()));
    }

    let content = json["choices"]
        .get(0)
        .and_then(|choice| choice["delta"]["content"].as_str())
        .filter(|c| !c.is_empty());

    Ok(content.map(|c| SseEvent::Delta(c.to_string())))
}
