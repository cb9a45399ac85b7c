use anyhow::Result;

use crate::models::Paper;

use super::{Envelope, HttpClient};

pub const THESIS_LIST_PATH: &str = "internship/thesis/list";

pub async fn get_thesis_list(http: &HttpClient) -> Result<Envelope<Vec<Paper>>> {
    http.get(THESIS_LIST_PATH).await
}
