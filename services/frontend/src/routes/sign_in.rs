//! GET /sign-in: start a Defra ID sign-in.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use defra_id_auth::request_authorization_code_url;
use serde::Deserialize;
use tracing::{info, warn};

use super::found;
use crate::AppState;
use crate::error::Result;
use crate::metrics;
use crate::session::Session;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInQuery {
    /// Organisation relationship to preselect at Defra ID
    #[serde(rename = "ssoOrgId")]
    pub sso_org_id: Option<String>,
}

/// Redirect to the Defra ID authorize endpoint. Open to unauthenticated users.
pub async fn sign_in(
    State(state): State<AppState>,
    Query(query): Query<SignInQuery>,
    session: Session,
) -> Result<Response> {
    if query.sso_org_id.as_deref() == Some("") {
        warn!("rejecting sign-in with empty ssoOrgId");
        return Ok((StatusCode::BAD_REQUEST, "ssoOrgId must not be empty").into_response());
    }

    let config = &state.config;
    let url = request_authorization_code_url(
        &config.defra_id,
        &session,
        config.namespace.as_deref(),
        query.sso_org_id.as_deref(),
    )?;

    let with_relationship = query.sso_org_id.is_some();
    metrics::record_sign_in(with_relationship);
    info!(relationship = with_relationship, "redirecting to Defra ID");

    Ok((session.into_cookie_jar(), found(url.as_str())).into_response())
}
