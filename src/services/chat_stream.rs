//! Word-by-word text stream used by the mock chat endpoint.
//!
//! Each frame is `0:` followed by `{"content":"<word> "}` and a newline.
//! A reply that carries scores ends with `ASSESSMENT_DATA:<json>`.
use crate::domain::chat::{ChatAssessment, ChatReply};
use futures::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use thiserror::Error;

pub const ASSESSMENT_MARKER: &str = "ASSESSMENT_DATA:";
const FRAME_PREFIX: &str = "0:";

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("frame is missing the 0: prefix")]
    MissingPrefix,
    #[error("frame has no content field")]
    MissingContent,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reply text with the assessment marker appended when scores are present.
pub fn compose(reply: &ChatReply) -> Result<String, serde_json::Error> {
    match &reply.assessment {
        Some(assessment) => Ok(format!(
            "{}\n\n{}{}",
            reply.text,
            ASSESSMENT_MARKER,
            serde_json::to_string(assessment)?
        )),
        None => Ok(reply.text.clone()),
    }
}

/// Splits on single spaces so newlines and the marker payload survive intact.
pub fn frames(text: &str) -> Vec<String> {
    text.split(' ').map(encode_frame).collect()
}

pub fn encode_frame(word: &str) -> String {
    let payload = serde_json::json!({ "content": format!("{word} ") });
    format!("{FRAME_PREFIX}{payload}\n")
}

pub fn decode_frame(line: &str) -> Result<String, StreamError> {
    let raw = line
        .trim_end_matches('\n')
        .strip_prefix(FRAME_PREFIX)
        .ok_or(StreamError::MissingPrefix)?;
    let value: serde_json::Value = serde_json::from_str(raw)?;
    value
        .get("content")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or(StreamError::MissingContent)
}

/// Reassembles a full response body into the reply text.
pub fn decode_body(body: &str) -> Result<String, StreamError> {
    let mut text = String::new();
    for line in body.lines().filter(|l| !l.is_empty()) {
        text.push_str(&decode_frame(line)?);
    }
    if text.ends_with(' ') {
        text.pop();
    }
    Ok(text)
}

/// Separates the visible text from an embedded assessment, if any.
pub fn split_assessment(text: &str) -> Result<(String, Option<ChatAssessment>), StreamError> {
    match text.split_once(ASSESSMENT_MARKER) {
        Some((visible, payload)) => {
            let assessment = serde_json::from_str(payload.trim())?;
            Ok((visible.trim_end().to_string(), Some(assessment)))
        }
        None => Ok((text.to_string(), None)),
    }
}

/// Frames of `text`, the first immediately and the rest `word_delay` apart.
pub fn paced(text: &str, word_delay: Duration) -> impl Stream<Item = Result<String, Infallible>> {
    stream::iter(frames(text).into_iter().enumerate()).then(move |(idx, frame)| async move {
        if idx > 0 && !word_delay.is_zero() {
            tokio::time::sleep(word_delay).await;
        }
        Ok(frame)
    })
}
