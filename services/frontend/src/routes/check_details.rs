//! /check-details: confirm the organisation held for the claim.

use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{info, warn};

use super::found;
use crate::AppState;
use crate::error::{Error, Result};
use crate::metrics::{self, CheckDetailsOutcome};
use crate::session::Session;
use crate::view::{self, CHECK_DETAILS, UPDATE_DETAILS, View};

const MISSING_ANSWER: &str = "Select if these details are correct";
const DEFAULT_NEXT_PAGE: &str = "/vet-visits";
const MULTIPLE_CLAIMS_PATH: &str = "/endemics/you-can-claim-multiple";

#[derive(Debug, Deserialize)]
pub struct CheckDetailsForm {
    #[serde(rename = "confirmCheckDetails")]
    confirm_check_details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
}

impl CheckDetailsForm {
    fn answer(&self) -> Option<Answer> {
        match self.confirm_check_details.as_deref()? {
            "yes" => Some(Answer::Yes),
            "no" => Some(Answer::No),
            _ => None,
        }
    }
}

/// GET: show the organisation for confirmation.
pub async fn show(session: Session) -> Result<View> {
    let organisation = session
        .organisation()
        .ok_or(Error::OrganisationNotInSession)?;
    Ok(View::new(
        CHECK_DETAILS,
        view::organisation_model(&organisation, None),
    ))
}

/// POST: act on the user's answer.
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    form: std::result::Result<Form<CheckDetailsForm>, FormRejection>,
) -> Result<Response> {
    let answer = match &form {
        Ok(Form(form)) => form.answer(),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable check-details form");
            None
        }
    };

    match answer {
        None => {
            warn!("check-details answer missing or invalid");
            metrics::record_check_details(CheckDetailsOutcome::Invalid);
            let organisation = session
                .organisation()
                .ok_or(Error::OrganisationNotInSession)?;
            Ok(View::new(
                CHECK_DETAILS,
                view::organisation_model(&organisation, Some(MISSING_ANSWER)),
            )
            .with_status(StatusCode::BAD_REQUEST)
            .into_response())
        }
        Some(Answer::Yes) => {
            metrics::record_check_details(CheckDetailsOutcome::Confirmed);
            if session.sign_in_redirect() {
                let apply = state.config.apply_service_uri.as_deref().unwrap_or_default();
                info!("details confirmed, continuing to apply journey");
                return Ok(found(&format!("{apply}{MULTIPLE_CLAIMS_PATH}")));
            }
            info!("details confirmed");
            Ok(found(DEFAULT_NEXT_PAGE))
        }
        Some(Answer::No) => {
            metrics::record_check_details(CheckDetailsOutcome::Rejected);
            info!("details rejected, showing update options");
            Ok(View::new(
                UPDATE_DETAILS,
                view::update_details_model(state.config.lfs_update.enabled),
            )
            .into_response())
        }
    }
}
