//! GET /update-details: hand off to the Land and Farm Service.

use axum::extract::State;
use axum::response::Response;
use tracing::info;

use super::found;
use crate::AppState;
use crate::error::{Error, Result};
use crate::metrics;
use crate::session::Session;

/// Redirect to LFS with the organisation id appended to the configured uri,
/// or back to /check-details when the hand-off is switched off.
pub async fn redirect(State(state): State<AppState>, session: Session) -> Result<Response> {
    let lfs = &state.config.lfs_update;
    let Some(base) = lfs.uri.as_deref().filter(|_| lfs.enabled) else {
        metrics::record_update_details("check_details");
        return Ok(found("/check-details"));
    };

    let organisation = session
        .organisation()
        .ok_or(Error::OrganisationNotInSession)?;

    metrics::record_update_details("lfs");
    info!("redirecting to Land and Farm Service");
    // No separator: the configured uri ends where the id belongs.
    Ok(found(&format!("{base}{}", organisation.id)))
}
