//! Todo resource handlers.
//!
//! The create path is asynchronous: the handler validates the payload,
//! hands it to the command publisher, and answers before any persistence
//! has happened, deliberately trading read-your-write consistency for
//! write availability. No identity exists yet when the response is sent,
//! so the response carries the correlation token instead of a location;
//! callers that need the record must poll the read side.
//!
//! The read/update/delete paths go straight to the persistence service.

use crate::error::AppError;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use todo_pipeline_core::publisher::PublishError;
use todo_pipeline_core::todo::{Todo, TodoDraft, TodoId};
use todo_pipeline_core::trace::RequestSpan;
use uuid::Uuid;

/// Response body for an accepted create request.
///
/// The command has been durably accepted by the message log but not yet
/// persisted, so there is no identity to return. The correlation token
/// lets the caller find the request in traces and logs.
#[derive(Debug, Serialize)]
pub struct CreateAccepted {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// Correlation token attached to the published command.
    pub correlation_id: Uuid,
}

/// `POST /todo`: accept a create command.
///
/// - `201`: the command was accepted by the message log (not yet
///   persisted; body carries the correlation token, no Location header)
/// - `406`: the body failed structural validation or could not be
///   serialized; nothing was published
/// - `500`: the message log did not accept the write; the command was NOT
///   accepted
pub async fn create_todo(
    State(state): State<AppState>,
    CorrelationId(correlation_id): CorrelationId,
    body: Result<Json<TodoDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAccepted>), AppError> {
    let mut span = RequestSpan::with_correlation_id("POST /todo", correlation_id);
    span.rename("todo.create");

    // Structural validation failures never reach the publisher.
    let draft = match body {
        Ok(Json(draft)) => draft,
        Err(rejection) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %rejection,
                "create request body rejected"
            );
            span.finish_error("invalid request body");
            return Err(AppError::not_acceptable("request body is not a valid todo"));
        }
    };

    tracing::info!(
        correlation_id = %correlation_id,
        title = %draft.title,
        "received create request"
    );

    match state.publisher.publish(&draft, &mut span).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreateAccepted {
                status: "accepted",
                correlation_id,
            }),
        )),
        Err(PublishError::Invalid(e)) => Err(AppError::not_acceptable(
            "todo could not be serialized",
        )
        .with_source(e.into())),
        Err(PublishError::Unavailable(e)) => {
            Err(AppError::internal("todo could not be accepted").with_source(e.into()))
        }
    }
}

/// `GET /todo`: all todos, `204` when none exist.
pub async fn list_todos(State(state): State<AppState>) -> Response {
    let todos = state.todos.get_all().await;

    if todos.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(todos)).into_response()
    }
}

/// `GET /todo/{id}`: one todo, or `404`.
pub async fn find_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, AppError> {
    let id = TodoId::from_uuid(id);

    state
        .todos
        .find_by_id(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("Todo", id))
}

/// `PUT /todo/{id}`: replace a todo's fields, `204` or `404`.
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<TodoDraft>,
) -> Result<StatusCode, AppError> {
    let id = TodoId::from_uuid(id);

    if state.todos.update(id, draft).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Todo", id))
    }
}

/// `DELETE /todo/{id}`: remove a todo, `204` or `404`.
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let id = TodoId::from_uuid(id);

    if state.todos.delete(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Todo", id))
    }
}
