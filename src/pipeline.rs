//! Renderings of an invocation stream for the outer surfaces.

use std::convert::Infallible;

use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use serde_json::Value;

use crate::agent::{AgentOutput, AgentOutputStream};

/// User-visible text in arrival order, metadata removed.
pub fn text_stream(outputs: AgentOutputStream) -> impl Stream<Item = String> + Send + 'static {
    outputs.filter_map(|output| futures::future::ready(output.into_text()))
}

/// Drain the stream and concatenate its text.
pub async fn collect_text(outputs: AgentOutputStream) -> String {
    text_stream(outputs).collect::<Vec<_>>().await.concat()
}

/// SSE events: one `data: {"text": ...}` per fragment, then `data: [DONE]`.
///
/// Metadata is dropped unless `include_metadata` is set, in which case it is
/// sent as a named `metadata` event before the terminator.
pub fn sse_events(
    outputs: AgentOutputStream,
    include_metadata: bool,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    async_stream::stream! {
        let mut outputs = outputs;
        while let Some(output) = outputs.next().await {
            match output {
                AgentOutput::Metadata(metadata) => {
                    if !include_metadata {
                        continue;
                    }
                    match Event::default().event("metadata").json_data(&metadata) {
                        Ok(event) => yield Ok(event),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize metadata event; dropping");
                        }
                    }
                }
                other => {
                    if let Some(text) = other.into_text() {
                        yield Ok(text_event(&text));
                    }
                }
            }
        }
        yield Ok(Event::default().data("[DONE]"));
    }
}

// Hand-formatted so the payload keeps the `{"text": ...}` spacing clients
// already parse.
fn text_event(text: &str) -> Event {
    Event::default().data(format!("{{\"text\": {}}}", Value::String(text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{InvocationMetadata, FRAMEWORK};
    use axum::response::{IntoResponse, Sse};

    fn outputs(items: Vec<AgentOutput>) -> AgentOutputStream {
        futures::stream::iter(items).boxed()
    }

    fn metadata() -> AgentOutput {
        AgentOutput::Metadata(InvocationMetadata {
            model: "gpt-4o-mini".to_string(),
            framework: FRAMEWORK.to_string(),
            api_url: "https://jsonplaceholder.typicode.com/todos".to_string(),
            todos_loaded: 200,
            user_id: "anonymous".to_string(),
        })
    }

    async fn render(items: Vec<AgentOutput>, include_metadata: bool) -> String {
        let response = Sse::new(sse_events(outputs(items), include_metadata)).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn sse_frames_fragments_and_terminator() {
        let body = render(
            vec![
                AgentOutput::Text("Hi".to_string()),
                AgentOutput::Text(" there".to_string()),
                metadata(),
            ],
            false,
        )
        .await;
        assert_eq!(
            body,
            "data: {\"text\": \"Hi\"}\n\ndata: {\"text\": \" there\"}\n\ndata: [DONE]\n\n"
        );
    }

    #[tokio::test]
    async fn sse_escapes_newlines_inside_fragments() {
        let body = render(vec![AgentOutput::Text("a\n\"b\"".to_string())], false).await;
        assert_eq!(body, "data: {\"text\": \"a\\n\\\"b\\\"\"}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn sse_errors_are_text_frames() {
        let body = render(vec![AgentOutput::Error("boom".to_string())], false).await;
        assert_eq!(body, "data: {\"text\": \"Error: boom\"}\n\ndata: [DONE]\n\n");
    }

    #[tokio::test]
    async fn sse_metadata_side_channel_when_requested() {
        let body = render(vec![AgentOutput::Text("Hi".to_string()), metadata()], true).await;
        assert!(body.starts_with("data: {\"text\": \"Hi\"}\n\nevent: metadata\ndata: {"));
        assert!(body.contains("\"todos_loaded\":200"));
        assert!(body.ends_with("\n\ndata: [DONE]\n\n"));
    }

    #[tokio::test]
    async fn empty_stream_still_terminates() {
        assert_eq!(render(vec![], false).await, "data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn streaming_concatenation_matches_batch() {
        let items = vec![
            AgentOutput::Text("You have ".to_string()),
            AgentOutput::Text("90 completed todos.".to_string()),
            metadata(),
        ];
        let streamed: Vec<String> = text_stream(outputs(items.clone())).collect().await;
        let batch = collect_text(outputs(items)).await;
        assert_eq!(streamed, vec!["You have ", "90 completed todos."]);
        assert_eq!(streamed.concat(), batch);
        assert!(!batch.contains("__METADATA__"));
    }
}
