//! Web front end for composing and publishing Threads posts
//!
//! Every page except the index and logout sits behind a login gate. The
//! gate signs the visitor in with the bootstrap credential the first time it
//! is needed; after that only the session counts.

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::{Arc, Mutex, MutexGuard};

use libthreadcast::{AccessToken, AuthContext, Session, ThreadcastService};

pub mod error;
pub mod forms;
pub mod handlers;
pub mod pages;

use crate::error::ApiError;

/// State shared by all handlers
pub struct AppState {
    pub service: ThreadcastService,
    auth: Mutex<AuthState>,
}

#[derive(Debug, Default)]
struct AuthState {
    context: AuthContext,
    session: Session,
}

impl AppState {
    pub fn new(service: ThreadcastService, auth: AuthContext) -> Self {
        Self {
            service,
            auth: Mutex::new(AuthState {
                context: auth,
                session: Session::default(),
            }),
        }
    }

    fn auth(&self) -> MutexGuard<'_, AuthState> {
        // The guarded data stays consistent even if a holder panicked
        self.auth.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Token of the signed-in user, signing in with the bootstrap credential if needed
    pub fn access_token(&self) -> Option<AccessToken> {
        let mut auth = self.auth();
        let AuthState { context, session } = &mut *auth;
        session.resolve(context)
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth().session.is_authenticated()
    }

    pub fn sign_out(&self) {
        self.auth().session.clear();
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/upload", get(handlers::upload_page).post(handlers::upload))
        .route("/publish", post(handlers::publish))
        .route("/publish/{container_id}", get(handlers::publish_page))
        .route(
            "/container/status/{container_id}",
            get(handlers::container_status),
        )
        .route("/repost", post(handlers::repost))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_login,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/logout", get(handlers::logout))
        .merge(gated)
        .with_state(state)
}

/// Let signed-in requests through with their token attached
///
/// Page loads are sent to the index with a `return_url`; API calls get a 401.
async fn require_login(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = state.access_token() {
        request.extensions_mut().insert(token);
        return next.run(request).await;
    }

    if request.method() == Method::GET {
        let target = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        tracing::debug!(target, "Not signed in, redirecting to index");
        Redirect::to(&format!("/?return_url={}", urlencoding::encode(target))).into_response()
    } else {
        ApiError::new(StatusCode::UNAUTHORIZED, "Not signed in").into_response()
    }
}
