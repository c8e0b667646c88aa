//! HTTP surface: the task page, the contact form and its confirmation page.

pub mod pages;

use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use formdesk_core::actions::{
    ActionOutcome, ActionState, ActionStatus, CONFIRMATION_ROUTE, CONTACT_ROUTE, FormActions,
    TASKS_ROUTE,
};
use formdesk_core::form::{FormFields, TaskSchema};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    actions: Arc<FormActions>,
}

impl AppState {
    pub fn new(actions: FormActions) -> Self {
        Self {
            actions: Arc::new(actions),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(TASKS_ROUTE, get(tasks_page).post(create_task))
        .route(CONTACT_ROUTE, get(contact_page).post(send_contact_message))
        .route(CONFIRMATION_ROUTE, get(thank_you_page))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pages are rendered from a fresh read and must never be served from a cache.
fn fresh_page(status: StatusCode, body: String) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Html(body)).into_response()
}

fn status_code(state: &ActionState) -> StatusCode {
    match state.status {
        ActionStatus::Success => StatusCode::OK,
        ActionStatus::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        ActionStatus::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// An unreadable body is treated as an empty submission, so it fails
/// validation and gets the form page back instead of a bare rejection.
fn submitted_fields(form: Result<Form<HashMap<String, String>>, FormRejection>) -> FormFields {
    match form {
        Ok(Form(raw)) => FormFields::from(raw),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable form body");
            FormFields::new()
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn tasks_page(State(state): State<AppState>) -> Response {
    let listing = state.actions.list_tasks().await;
    fresh_page(StatusCode::OK, pages::tasks_page(None, None, &listing))
}

async fn create_task(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let fields = submitted_fields(form);
    match state.actions.create_task(&fields).await {
        ActionOutcome::Render(action) => {
            let listing = state.actions.list_tasks().await;
            let draft = match action.status {
                ActionStatus::Success => None,
                _ => fields.get(TaskSchema::TODO),
            };
            fresh_page(
                status_code(&action),
                pages::tasks_page(Some(&action), draft, &listing),
            )
        }
        ActionOutcome::Redirect(to) => Redirect::to(to).into_response(),
    }
}

async fn contact_page() -> Response {
    fresh_page(StatusCode::OK, pages::contact_page(None, &FormFields::new()))
}

async fn send_contact_message(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let fields = submitted_fields(form);
    match state.actions.send_contact_message(&fields).await {
        ActionOutcome::Redirect(to) => Redirect::to(to).into_response(),
        ActionOutcome::Render(action) => {
            let kept = match action.status {
                ActionStatus::Success => FormFields::new(),
                _ => fields,
            };
            fresh_page(
                status_code(&action),
                pages::contact_page(Some(&action), &kept),
            )
        }
    }
}

async fn thank_you_page(State(state): State<AppState>) -> Response {
    let listing = state.actions.list_messages().await;
    fresh_page(StatusCode::OK, pages::thank_you_page(&listing))
}

#[cfg(test)]
mod tests {
    use super::{AppState, router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use formdesk_core::actions::{FormActions, INVALID_SUBMISSION};
    use formdesk_core::storage::{MemoryMessageStore, MemoryTaskStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        router(AppState::new(FormActions::new(
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryMessageStore::new()),
        )))
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let resp = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1_000).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn listing_pages_forbid_caching() {
        for uri in ["/", "/contact", "/contact/thank-you"] {
            let resp = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store", "{uri}");
        }
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let resp = app()
            .oneshot(Request::builder().uri("/nonexistent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_without_form_content_type_rerenders_form() {
        for uri in ["/", "/contact"] {
            let resp = app()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from("{\"todo\":\"buy milk\"}"))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
            let page = String::from_utf8(body.to_vec()).unwrap();
            assert!(page.contains(INVALID_SUBMISSION), "{uri}");
            assert!(page.contains("<form method=\"post\""), "{uri}");
        }
    }
}
