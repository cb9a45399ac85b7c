use anyhow::Result;

use crate::models::Student;

use super::{Envelope, HttpClient};

pub const UNSELECTED_STUDENTS_PATH: &str = "internship/intern/unselectedList";

/// Students who have not submitted a selection yet, used to build teams.
pub async fn get_unselected_students(http: &HttpClient) -> Result<Envelope<Vec<Student>>> {
    http.get(UNSELECTED_STUDENTS_PATH).await
}
