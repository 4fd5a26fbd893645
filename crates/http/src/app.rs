//! Demo application wiring every helper into one Axum router.
//!
//! - `GET /health`: JSON status
//! - `GET /`: rendered `index.html`
//! - `GET /report.xml`: XML encoder
//! - `POST /signup`: form binding with per-field errors
//! - `GET /me`: handler wrapped with `Guard::protect`
//! - `GET /admin`: routes behind `Guard::layer`
//! - `<static prefix>/*`: static files
//!
//! The demo principal comes from an `x-demo-user: name[:role,role]` header.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use axum::routing::{get, get_service, post};
use axum::Router;
use minions_auth::{Anonymous, Principal, User};
use minions_core::{BindingResult, vars};
use serde::{Deserialize, Serialize};

use crate::config::HttpConfig;
use crate::context::CurrentPrincipal;
use crate::encode::{self, EncodeError};
use crate::files::static_files;
use crate::guard::Guard;
use crate::templates::{TemplateError, Templates};

pub const DEMO_USER_HEADER: &str = "x-demo-user";

#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<Templates>,
}

/// Build the demo router (public entrypoint used by `main.rs`).
pub fn build_app(config: &HttpConfig) -> Router {
    let templates = Arc::new(Templates::new(config.template_dir.clone(), config.template_reload));
    build_app_with(config, templates)
}

/// Same as [`build_app`] with an existing template store.
pub fn build_app_with(config: &HttpConfig, templates: Arc<Templates>) -> Router {
    let guard = demo_guard();

    let admin = Router::new()
        .route("/admin", get(admin_page))
        .route_layer(guard.layer(["admin"]));

    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/report.xml", get(report))
        .route("/signup", post(signup))
        .route("/me", get_service(guard.protect(me, ["user", "admin"])))
        .merge(admin)
        .with_state(AppState { templates })
        .merge(static_files(&config.static_prefix, &config.static_dir))
}

pub fn demo_guard() -> Guard {
    Guard::new().principal_fn(demo_principal)
}

/// `x-demo-user: alice:admin,editor` → `User { id: "alice", roles: [admin, editor] }`.
fn demo_principal(parts: &Parts) -> Box<dyn Principal> {
    let Some(value) = parts
        .headers
        .get(DEMO_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    else {
        return Box::new(Anonymous);
    };

    let (name, roles) = value.split_once(':').unwrap_or((value, ""));
    let roles = roles
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Box::new(User::new(name.trim()).with_roles(roles))
}

async fn health() -> Result<Response, EncodeError> {
    encode::json(StatusCode::OK, &vars! { "status" => "ok" })
}

async fn index(State(state): State<AppState>) -> Result<Response, TemplateError> {
    state
        .templates
        .html(StatusCode::OK, "index.html", &vars! { "title" => "minions" })
}

async fn admin_page(
    State(state): State<AppState>,
    who: CurrentPrincipal,
) -> Result<Response, TemplateError> {
    state.templates.html(
        StatusCode::OK,
        "admin/dashboard.html",
        &vars! { "user" => (who.id()) },
    )
}

async fn me(who: CurrentPrincipal) -> Result<Response, EncodeError> {
    encode::json(StatusCode::OK, &vars! { "id" => (who.id()) })
}

#[derive(Debug, Serialize)]
#[serde(rename = "report")]
struct Report {
    title: &'static str,
    entry: Vec<ReportEntry>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    name: &'static str,
    count: u32,
}

async fn report() -> Result<Response, EncodeError> {
    let report = Report {
        title: "daily",
        entry: vec![
            ReportEntry { name: "signups", count: 3 },
            ReportEntry { name: "logins", count: 12 },
        ],
    };
    encode::xml(StatusCode::OK, &report)
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> BindingResult {
        let mut result = BindingResult::new();
        if self.email.trim().is_empty() {
            result.fail("email", "must not be empty");
        } else if !self.email.contains('@') {
            result.fail("email", "must be an email address");
        }
        if self.password.len() < 8 {
            result.fail("password", "must be at least 8 characters");
        }
        result
    }
}

async fn signup(Form(form): Form<SignupForm>) -> Result<Response, EncodeError> {
    let errors = form.validate();
    if !errors.is_valid() {
        return encode::json(StatusCode::UNPROCESSABLE_ENTITY, &vars! { "errors" => errors });
    }

    tracing::info!(email = %form.email, "signup accepted");
    encode::json(StatusCode::CREATED, &vars! { "email" => (form.email) })
}
