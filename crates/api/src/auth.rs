use crate::handlers::error_response;
use crate::AppState;
use axum::{
    extract::{Form, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use dockhand_auth::{issue_token, strip_bearer, verify_token};
use dockhand_models::{ErrorShape, LoginForm, TokenResponse};
use tracing::{info, instrument, warn};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Browser login: set the session cookie and bounce to the dashboard.
#[instrument(skip(state, jar, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.users.authenticate(&form.username, &form.password).await {
        Ok(user) => {
            let token = match issue_token(
                &user.username,
                &state.config.auth.secret_key,
                state.config.auth.token_ttl_minutes,
            ) {
                Ok(token) => token,
                Err(e) => return error_response(&e).into_response(),
            };

            info!("User logged in: {}", user.username);
            let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token))
                .path("/")
                .http_only(true)
                .build();
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(e) => {
            warn!("Login failed for {}: {}", form.username, e);
            Redirect::to("/login?error=1").into_response()
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::from(ACCESS_TOKEN_COOKIE)),
        Redirect::to("/login"),
    )
}

/// Programmatic login, OAuth2 password style: form in, JSON token out.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn issue_api_token(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorShape>)> {
    match state.users.authenticate(&form.username, &form.password).await {
        Ok(user) => {
            let token = issue_token(
                &user.username,
                &state.config.auth.secret_key,
                state.config.auth.token_ttl_minutes,
            )
            .map_err(|e| error_response(&e))?;
            Ok(Json(TokenResponse::bearer(token)))
        }
        Err(e) => {
            warn!("Token request failed for {}: {}", form.username, e);
            Err(error_response(&e))
        }
    }
}

/// Auth middleware: accept a bearer header or the session cookie. Browsers
/// get redirected to the login page, API clients get a 401 shape.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    // The cookie holds the bare token; a "Bearer " prefix is tolerated.
    let token = bearer_from_headers(request.headers()).or_else(|| {
        jar.get(ACCESS_TOKEN_COOKIE)
            .map(|c| strip_bearer(c.value()).unwrap_or(c.value()).to_owned())
    });
    let wants_html = accepts_html(request.headers());

    let username = token.and_then(|t| {
        verify_token(&t, &state.config.auth.secret_key)
            .ok()
            .map(|claims| claims.sub)
    });

    let Some(username) = username else {
        return unauthorized(wants_html);
    };

    // A valid token for a deleted user is still a denial.
    match state.users.find_user(&username).await {
        Ok(Some(_)) => next.run(request).await,
        _ => unauthorized(wants_html),
    }
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(strip_bearer)
        .map(str::to_owned)
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false)
}

fn unauthorized(wants_html: bool) -> Response {
    if wants_html {
        Redirect::to("/login").into_response()
    } else {
        error_response(&dockhand_models::DockhandError::NotAuthenticated).into_response()
    }
}
