use serde_json::Value;

use crate::transport::{ApiClient, ApiError};

/// Counts shown on the admin dashboard.
pub async fn dashboard_stats(client: &ApiClient) -> Result<Value, ApiError> {
    client.get("/admin/dashboard/stats").await
}
