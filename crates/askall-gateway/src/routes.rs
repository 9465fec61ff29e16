//! Router and request handlers

use std::path::Path;
use std::sync::Arc;

use askall_core::Dispatcher;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::protocol::{ASK_ALL_PATH, AskRequest, ERR_INTERNAL, ERR_PROMPT_MISSING, ErrorResponse};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the axum router: the API route plus static files from `public_dir`.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route(ASK_ALL_PATH, post(ask_all))
        .with_state(state)
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
}

async fn ask_all(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    // An unreadable body carries no prompt either.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected /ask-all body: {}", rejection.body_text());
            AskRequest::default()
        }
    };

    let Some(prompt) = request.prompt() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(ERR_PROMPT_MISSING)),
        )
            .into_response();
    };

    debug!(prompt_len = prompt.len(), "Dispatching prompt to all providers");

    match state.dispatcher.ask_all(prompt).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!("ask-all failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(ERR_INTERNAL)),
            )
                .into_response()
        }
    }
}
