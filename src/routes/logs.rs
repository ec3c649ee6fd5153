use axum::{
    extract::{Path, State},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::AppState;
use crate::clients::BackendClient;

enum TailPhase {
    // Result of the open-time fetch plus whether to keep polling after it
    First(Event, bool),
    Poll,
    Done,
}

/// Live log tail for one container as an SSE stream.
///
/// On open the log text is fetched once. If the container is running the
/// fetch repeats on the configured interval; a stopped container's logs are
/// static, so its stream ends after the single snapshot. Every `log` event
/// carries the full buffer (wholesale replacement, no append). The rendering
/// layer closing the panel drops the response body, which cancels all future
/// ticks; switching containers is a fresh request, so loops never overlap.
pub async fn handle_log_stream(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let backend = state.backend.clone();
    let interval = Duration::from_secs(state.config.log_interval_secs);

    let phase = match backend.container_logs(&id).await {
        Ok(tail) => {
            let running = tail.container.status == "running";
            TailPhase::First(Event::default().event("log").data(tail.logs), running)
        }
        Err(e) => TailPhase::First(Event::default().event("error").data(e.to_string()), false),
    };

    let tail_stream = stream::unfold(
        (backend, id, interval, phase),
        |(backend, id, interval, phase)| async move {
            match phase {
                TailPhase::First(event, keep_polling) => {
                    let next = if keep_polling {
                        TailPhase::Poll
                    } else {
                        TailPhase::Done
                    };
                    Some((Ok::<_, Infallible>(event), (backend, id, interval, next)))
                }
                TailPhase::Poll => {
                    tokio::time::sleep(interval).await;
                    let (event, next) = next_tick(&backend, &id).await;
                    Some((Ok(event), (backend, id, interval, next)))
                }
                TailPhase::Done => None,
            }
        },
    );

    Sse::new(tail_stream)
        .keep_alive(KeepAlive::default().interval(Duration::from_secs(15)))
        .into_response()
}

async fn next_tick(backend: &Arc<BackendClient>, id: &str) -> (Event, TailPhase) {
    match backend.container_logs(id).await {
        Ok(tail) => {
            let next = if tail.container.status == "running" {
                TailPhase::Poll
            } else {
                // Final snapshot: the container stopped, logs are static now
                TailPhase::Done
            };
            (Event::default().event("log").data(tail.logs), next)
        }
        Err(e) => (
            Event::default().event("error").data(e.to_string()),
            TailPhase::Done,
        ),
    }
}
