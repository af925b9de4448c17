//! HTTP surface: `GET {base}/start` and `GET {base}/complete`

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::warn;

use crate::callback::LoginOutcome;
use crate::error::LoginError;
use crate::{BridgeState, cookies, metrics};

#[derive(Debug, Deserialize)]
struct StartParams {
    desktop_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompleteParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

pub fn routes(state: BridgeState) -> Router {
    let base = state.base_path.clone();
    Router::new()
        .route(&format!("{base}/start"), get(start))
        .route(&format!("{base}/complete"), get(complete))
        .with_state(state)
}

/// 302 Found. axum's `Redirect` only offers 303/307/308.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

async fn start(State(state): State<BridgeState>, Query(params): Query<StartParams>) -> Response {
    let url = state.initiator.start(params.desktop_token.as_deref()).await;
    found(url.as_str())
}

async fn complete(
    State(state): State<BridgeState>,
    jar: CookieJar,
    Query(params): Query<CompleteParams>,
) -> Result<(CookieJar, Response), LoginError> {
    let result = finish(&state, jar, params).await;
    if let Err(e) = &result {
        metrics::record_login_failure(e.kind());
    }
    result
}

async fn finish(
    state: &BridgeState,
    jar: CookieJar,
    params: CompleteParams,
) -> Result<(CookieJar, Response), LoginError> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        warn!(error = %error, description = %description, "provider returned an error");
        // Free the pending entry now rather than waiting for the TTL
        if let Some(s) = params.state.as_deref() {
            state.callback.branch_for(s).await;
        }
        return Err(LoginError::ProviderDenied(error));
    }

    let code = required(params.code, "code")?;
    let login_state = required(params.state, "state")?;

    let outcome = state.callback.complete(&code, &login_state).await?;
    metrics::record_login_completed(outcome.label());

    match outcome {
        LoginOutcome::Desktop { redirect, .. } => Ok((jar, found(redirect.as_str()))),
        LoginOutcome::Standard { session, .. } => {
            let (token, user) = cookies::session_cookies(&state.cookies, &session);
            Ok((jar.add(token).add(user), found(&state.login_redirect)))
        }
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, LoginError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            warn!(param = name, "completion request missing parameter");
            Err(LoginError::InvalidRequest(format!("missing {name}")))
        }
    }
}
