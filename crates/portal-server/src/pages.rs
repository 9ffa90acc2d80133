//! Page shells for the browser. Rendering and interaction live client-side;
//! the server only decides who may see which page.

use axum::{
    extract::Query,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect},
};
use serde::Deserialize;

use crate::middleware::session_from_headers;

const DEFAULT_LANDING: &str = "/pricing";

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    next: Option<String>,
}

/// GET /: signed-in users land on the pricing session, everyone else on the
/// login page.
pub async fn index(headers: HeaderMap) -> Redirect {
    if session_from_headers(&headers).is_authenticated() {
        Redirect::to(DEFAULT_LANDING)
    } else {
        Redirect::to("/login")
    }
}

/// GET /login
pub async fn login_page(Query(query): Query<LoginQuery>) -> impl IntoResponse {
    let next = escape_html(safe_next(query.next.as_deref()));
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in · Product Pricing</title></head>
<body>
<main id="app" data-page="login" data-next="{next}">
<form id="login-form">
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input name="password" type="password" autocomplete="current-password" required></label>
<button type="submit">Sign in</button>
<p id="login-error" role="alert" hidden></p>
</form>
</main>
<script>
const app = document.getElementById("app");
document.getElementById("login-form").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const form = new FormData(event.target);
  const res = await fetch("/api/auth/login", {{
    method: "POST",
    headers: {{ "content-type": "application/json" }},
    body: JSON.stringify({{ username: form.get("username"), password: form.get("password") }}),
  }});
  if (res.ok) {{ window.location.assign(app.dataset.next); return; }}
  const err = document.getElementById("login-error");
  const body = await res.json().catch(() => null);
  err.textContent = body?.error?.message ?? "Login failed";
  err.hidden = false;
}});
</script>
</body>
</html>
"#
    ))
}

/// GET /pricing
pub async fn pricing_page() -> Html<&'static str> {
    Html(PRICING_SHELL)
}

/// GET /admin
pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_SHELL)
}

const PRICING_SHELL: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Pricing Session · Product Pricing</title></head>
<body><main id="app" data-page="pricing" data-api="/api/products"></main></body>
</html>
"#;

const ADMIN_SHELL: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin · Product Pricing</title></head>
<body><main id="app" data-page="admin" data-api="/api/products" data-export="/api/export"></main></body>
</html>
"#;

/// Only same-origin paths are accepted as a post-login destination.
/// Accept `next` only when a browser would resolve it to a path on this
/// origin. Backslashes and control characters are refused outright since
/// browsers fold them into `//host`.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => DEFAULT_LANDING,
    }
}

fn is_local_path(path: &str) -> bool {
    const ORIGIN: &str = "http://portal.invalid/";

    if !path.starts_with('/') || path.starts_with("//") {
        return false;
    }
    if path.chars().any(|c| c == '\\' || c.is_control()) {
        return false;
    }
    url::Url::parse(ORIGIN)
        .and_then(|origin| origin.join(path))
        .is_ok_and(|resolved| resolved.host_str() == Some("portal.invalid"))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_next_keeps_local_paths() {
        assert_eq!(safe_next(Some("/admin")), "/admin");
    }

    #[test]
    fn safe_next_rejects_foreign_destinations() {
        assert_eq!(safe_next(None), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("https://evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("//evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\\evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\t/evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\n/evil.example")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("evil.example")), DEFAULT_LANDING);
    }

    #[test]
    fn safe_next_keeps_query_and_nested_paths() {
        assert_eq!(safe_next(Some("/pricing?item=3")), "/pricing?item=3");
        assert_eq!(safe_next(Some("/admin/products")), "/admin/products");
    }

    #[test]
    fn escape_html_neutralises_markup() {
        assert_eq!(
            escape_html(r#"/x"><script>"#),
            "/x&quot;&gt;&lt;script&gt;"
        );
    }
}
