use axum::{
    extract::Request,
    http::{header::COOKIE, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use portal_core::{
    session::{SESSION_COOKIE_NAME, SESSION_MARKER, SESSION_MAX_AGE_SECS},
    AppConfig, Credentials, Environment, MissingCredentials, ResolvedCredentials, Session,
};
use serde::Serialize;
use uuid::Uuid;

/// Characters escaped in the `next` query value. `/` stays literal so the
/// redirect reads `/login?next=/pricing`.
const NEXT_PARAM: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'?');

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-credential settings used by the login handler.
///
/// Secrets are kept raw and resolved per login attempt so a misconfigured
/// production deployment reports the missing keys to the operator instead of
/// refusing to start.
#[derive(Clone)]
pub struct AuthSettings {
    env: Environment,
    admin_user: Option<String>,
    admin_pass: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("env", &self.env)
            .field("admin_user", &self.admin_user.as_ref().map(|_| "[redacted]"))
            .field("admin_pass", &self.admin_pass.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl AuthSettings {
    #[must_use]
    pub fn new(env: Environment, admin_user: Option<String>, admin_pass: Option<String>) -> Self {
        Self {
            env,
            admin_user,
            admin_pass,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.env.clone(),
            config.admin_user.clone(),
            config.admin_pass.clone(),
        )
    }

    pub fn credentials(&self) -> Result<ResolvedCredentials, MissingCredentials> {
        Credentials::resolve(
            &self.env,
            self.admin_user.as_deref(),
            self.admin_pass.as_deref(),
        )
    }

    /// The `Secure` cookie attribute is only set in production so the portal
    /// works over plain HTTP during local development.
    #[must_use]
    pub fn secure_cookie(&self) -> bool {
        self.env.is_production()
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for MiddlewareErrorBody {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// What the route guard does with a request to a protected path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send the browser to the login page, carrying the requested path.
    RedirectToLogin(String),
    /// API callers get a 401 instead of a redirect.
    Reject,
}

#[must_use]
pub fn guard_decision(path: &str, session: Session) -> GuardDecision {
    if session.is_authenticated() {
        GuardDecision::Allow
    } else if is_api_path(path) {
        GuardDecision::Reject
    } else {
        GuardDecision::RedirectToLogin(login_redirect_target(path))
    }
}

fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/")
}

fn login_redirect_target(path: &str) -> String {
    format!("/login?next={}", utf8_percent_encode(path, NEXT_PARAM))
}

/// Middleware guarding the pricing UI, the admin UI, the products API and
/// the export API.
pub async fn require_session(req: Request, next: Next) -> Response {
    let session = session_from_headers(req.headers());

    match guard_decision(req.uri().path(), session) {
        GuardDecision::Allow => next.run(req).await,
        GuardDecision::RedirectToLogin(target) => Redirect::temporary(&target).into_response(),
        GuardDecision::Reject => MiddlewareErrorBody {
            error: MiddlewareError {
                code: "unauthorized",
                message: "unauthorized",
            },
        }
        .into_response(),
    }
}

/// Classify the request by its session cookie. Every `Cookie` header is
/// searched.
pub fn session_from_headers(headers: &HeaderMap) -> Session {
    let value = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookies| extract_cookie(cookies, SESSION_COOKIE_NAME));
    Session::from_cookie(value)
}

fn extract_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}

/// `Set-Cookie` value issued on successful login.
#[must_use]
pub fn session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={SESSION_MARKER}; HttpOnly; SameSite=Lax; Path=/; Max-Age={SESSION_MAX_AGE_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn cleared_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
