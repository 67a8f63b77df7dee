//! Prometheus metrics exposition
//!
//! - `frontend_sign_in_redirects_total` (counter): label `relationship`
//! - `frontend_check_details_total` (counter): label `outcome`
//! - `frontend_update_details_redirects_total` (counter): label `target`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

/// Record a redirect to Defra ID.
pub fn record_sign_in(with_relationship: bool) {
    metrics::counter!(
        "frontend_sign_in_redirects_total",
        "relationship" => with_relationship.to_string()
    )
    .increment(1);
}

/// Answer given on the check-details page.
#[derive(Debug, Clone, Copy)]
pub enum CheckDetailsOutcome {
    Confirmed,
    Rejected,
    Invalid,
}

impl CheckDetailsOutcome {
    fn as_str(self) -> &'static str {
        match self {
            CheckDetailsOutcome::Confirmed => "confirmed",
            CheckDetailsOutcome::Rejected => "rejected",
            CheckDetailsOutcome::Invalid => "invalid",
        }
    }
}

pub fn record_check_details(outcome: CheckDetailsOutcome) {
    metrics::counter!("frontend_check_details_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record where update-details sent the user (`lfs` or `check_details`).
pub fn record_update_details(target: &'static str) {
    metrics::counter!("frontend_update_details_redirects_total", "target" => target).increment(1);
}
