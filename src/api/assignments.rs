use http::Method;
use serde_json::{json, Value};

use super::{path_segment, query_pairs, require};
use crate::transport::client::decode;
use crate::transport::{ApiClient, ApiError};

/// Assignments across the courses the student is enrolled in.
pub async fn for_student(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/assignments/student").await
}

pub async fn upcoming(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/assignments/student/upcoming").await
}

pub async fn get(client: &ApiClient, assignment_id: &str) -> Result<Value, ApiError> {
    let id = path_segment(assignment_id, "assignment id")?;
    client.get(&format!("/assignments/{}", id)).await
}

/// Every assignment the admin manages.
pub async fn for_admin(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/assignments/admin").await
}

pub async fn create(client: &ApiClient, assignment: &Value) -> Result<Value, ApiError> {
    let request = client
        .request(Method::POST, "/assignments/")
        .query(&query_pairs(assignment))
        .json(assignment);
    decode(client.send(request).await?).await
}

pub async fn delete(client: &ApiClient, assignment_id: &str) -> Result<(), ApiError> {
    let id = path_segment(assignment_id, "assignment id")?;
    client.delete(&format!("/assignments/{}", id)).await
}

pub async fn submissions(client: &ApiClient, assignment_id: &str) -> Result<Value, ApiError> {
    let id = path_segment(assignment_id, "assignment id")?;
    client
        .get(&format!("/assignments/{}/submissions", id))
        .await
}

/// The signed-in student's own submission for an assignment.
pub async fn my_submission(client: &ApiClient, assignment_id: &str) -> Result<Value, ApiError> {
    let id = path_segment(assignment_id, "assignment id")?;
    client.get(&format!("/assignments/{}/submission", id)).await
}

pub async fn submit(client: &ApiClient, assignment_id: &str, content: &str) -> Result<Value, ApiError> {
    let id = require(assignment_id, "assignment id")?;
    client
        .post_json(
            "/assignments/submissions/",
            &json!({ "assignment_id": id, "content": content }),
        )
        .await
}

pub async fn update_submission(
    client: &ApiClient,
    submission_id: &str,
    assignment_id: &str,
    content: &str,
) -> Result<Value, ApiError> {
    let submission = path_segment(submission_id, "submission id")?;
    let assignment = require(assignment_id, "assignment id")?;
    client
        .put_json(
            &format!("/assignments/submissions/{}", submission),
            &json!({ "assignment_id": assignment, "content": content }),
        )
        .await
}

pub async fn grade(
    client: &ApiClient,
    submission_id: &str,
    points: f64,
    feedback: Option<&str>,
) -> Result<Value, ApiError> {
    let id = path_segment(submission_id, "submission id")?;
    client
        .post_json(
            &format!("/assignments/submissions/{}/grade", id),
            &json!({ "points": points, "feedback": feedback.unwrap_or_default() }),
        )
        .await
}
