use serde_json::{json, Value};

use super::require;
use crate::transport::{ApiClient, ApiError};

pub async fn enroll(client: &ApiClient, course_id: &str) -> Result<Value, ApiError> {
    let id = require(course_id, "course id")?;
    client
        .post_json("/enrollments/", &json!({ "course_id": id }))
        .await
}

/// Courses the signed-in student is enrolled in.
pub async fn mine(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/enrollments/student").await
}
