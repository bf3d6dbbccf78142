//! Chat endpoints.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Response, Sse,
    },
    Json,
};
use futures::{Stream, StreamExt};

use super::routes::{error_response, AppState};
use super::types::{ChatRequest, ChatResponse, StreamQuery};
use crate::agent::FRAMEWORK;
use crate::pipeline::{collect_text, sse_events, text_stream};

/// `POST /chat`: buffered JSON reply, or plain streamed text when the request
/// sets `stream`.
pub async fn chat(State(state): State<Arc<AppState>>, Json(request): Json<ChatRequest>) -> Response {
    tracing::info!(
        user_id = ?request.user_id,
        history_turns = request.chat_history.len(),
        stream = request.stream,
        "Chat request"
    );

    if request.stream {
        let outputs = state.agent.invoke(
            &request.message,
            &request.chat_history,
            request.user_id.as_deref(),
        );
        let body = Body::from_stream(text_stream(outputs).map(Ok::<_, Infallible>));
        return ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response();
    }

    // Surface setup failures as a status code; mid-stream failures still
    // arrive as error text.
    if let Err(e) = state.agent.ensure_ready().await {
        tracing::error!(error = %e, "Error in chat endpoint");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    let outputs = state.agent.invoke(
        &request.message,
        &request.chat_history,
        request.user_id.as_deref(),
    );
    let response = collect_text(outputs).await;

    Json(ChatResponse {
        response,
        model: state.agent.model().to_string(),
        framework: FRAMEWORK.to_string(),
    })
    .into_response()
}

/// `POST /chat/stream`: Server-Sent Events.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(
        user_id = ?request.user_id,
        history_turns = request.chat_history.len(),
        metadata = query.metadata,
        "Streaming chat request"
    );

    let outputs = state.agent.invoke(
        &request.message,
        &request.chat_history,
        request.user_id.as_deref(),
    );

    Sse::new(sse_events(outputs, query.metadata)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
