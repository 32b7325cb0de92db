use http::Method;
use serde_json::Value;

use super::{path_segment, query_pairs};
use crate::transport::client::decode;
use crate::transport::{ApiClient, ApiError};

pub async fn list(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/courses/").await
}

pub async fn get(client: &ApiClient, course_id: &str) -> Result<Value, ApiError> {
    let id = path_segment(course_id, "course id")?;
    client.get(&format!("/courses/{}", id)).await
}

pub async fn create(client: &ApiClient, course: &Value) -> Result<Value, ApiError> {
    let request = client
        .request(Method::POST, "/courses/")
        .query(&query_pairs(course))
        .json(course);
    decode(client.send(request).await?).await
}

/// Only the fields present in `course` are changed.
pub async fn update(client: &ApiClient, course_id: &str, course: &Value) -> Result<Value, ApiError> {
    let id = path_segment(course_id, "course id")?;
    let request = client
        .request(Method::PUT, &format!("/courses/{}", id))
        .query(&query_pairs(course))
        .json(course);
    decode(client.send(request).await?).await
}

/// The backend refuses while students are still enrolled; that comes back as a validation error.
pub async fn delete(client: &ApiClient, course_id: &str) -> Result<(), ApiError> {
    let id = path_segment(course_id, "course id")?;
    client.delete(&format!("/courses/{}", id)).await
}

pub async fn assignments(client: &ApiClient, course_id: &str) -> Result<Value, ApiError> {
    let id = path_segment(course_id, "course id")?;
    client.get(&format!("/courses/{}/assignments", id)).await
}
