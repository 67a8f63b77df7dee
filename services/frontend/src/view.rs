//! View responses
//!
//! Pages are rendered elsewhere; this service answers with the view name and
//! the model the page is rendered from.

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::session::Organisation;

pub const CHECK_DETAILS: &str = "check-details";
pub const UPDATE_DETAILS: &str = "update-details";

/// Rural Payments Agency helpline shown when details are wrong.
pub const RPA_CONTACT_DETAILS: RpaContactDetails = RpaContactDetails {
    email: "ruralpayments@defra.gov.uk",
    telephone: "03000 200 301",
    call_charges_uri: "https://www.gov.uk/call-charges",
};

#[derive(Debug, Clone, Copy)]
pub struct RpaContactDetails {
    pub email: &'static str,
    pub telephone: &'static str,
    pub call_charges_uri: &'static str,
}

impl RpaContactDetails {
    fn to_json(self) -> Value {
        json!({
            "email": self.email,
            "telephone": self.telephone,
            "callChargesUri": self.call_charges_uri,
        })
    }
}

/// A named view and its model.
#[derive(Debug)]
pub struct View {
    name: &'static str,
    model: Value,
    status: StatusCode,
}

impl View {
    pub fn new(name: &'static str, model: Value) -> Self {
        Self {
            name,
            model,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        (
            self.status,
            [(CONTENT_TYPE, "application/json")],
            json!({ "view": self.name, "model": self.model }).to_string(),
        )
            .into_response()
    }
}

/// Model for the check-details page: a summary list of the organisation.
///
/// Rows without a value are left out.
pub fn organisation_model(organisation: &Organisation, error_text: Option<&str>) -> Value {
    let rows: Vec<Value> = [
        ("Farmer name", &organisation.farmer_name),
        ("Business name", &organisation.name),
        ("SBI number", &organisation.sbi),
        ("Organisation email address", &organisation.org_email),
        ("User email address", &organisation.email),
        ("Address", &organisation.address),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .map(|text| json!({ "key": { "text": label }, "value": { "text": text } }))
    })
    .collect();

    let mut model = json!({
        "organisation": organisation,
        "listData": { "rows": rows },
    });
    if let Some(text) = error_text {
        model["errorText"] = Value::from(text);
        model["errorMessage"] = json!({ "text": text });
    }
    model
}

/// Model for the update-details page.
pub fn update_details_model(lfs_update_enabled: bool) -> Value {
    json!({
        "lfsUpdateEnabled": lfs_update_enabled,
        "ruralPaymentsAgency": RPA_CONTACT_DETAILS.to_json(),
        "lfsUpdateDetailsLink": "/update-details",
    })
}
