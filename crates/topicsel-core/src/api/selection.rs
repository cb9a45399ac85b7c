//! Selection application endpoints.

use anyhow::Result;
use serde_json::Value;

use crate::models::{ApplySelectionParams, SelectionDetail};

use super::{Envelope, HttpClient};

pub const APPLY_PATH: &str = "internship/selection/apply";
pub const STATUS_PATH: &str = "internship/selection/status";
pub const DETAIL_PATH: &str = "internship/selection/detail";

/// Submit an individual or group application. The backend answers with
/// `code` and `message` only, so `data` is usually `None`.
pub async fn apply_selection(
    http: &HttpClient,
    params: &ApplySelectionParams,
) -> Result<Envelope<Value>> {
    http.post(APPLY_PATH, params).await
}

/// `data` is true once the current student has a selection on record.
pub async fn check_selection_status(http: &HttpClient) -> Result<Envelope<bool>> {
    http.get(STATUS_PATH).await
}

pub async fn get_selection_detail(http: &HttpClient) -> Result<Envelope<SelectionDetail>> {
    http.get(DETAIL_PATH).await
}
