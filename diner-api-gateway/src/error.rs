use axum::{http::StatusCode, response::Json};
use diner_dashboard_service::{service::DashboardError, store::StoreError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// Maps an action failure, naming `resource` when the target row is missing.
    pub fn for_resource(resource: &str, err: DashboardError) -> Self {
        match err {
            DashboardError::Store(StoreError::NotFound) => ApiError::NotFound(resource.to_string()),
            err => err.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::UnknownMenuItem(id) => {
                ApiError::BadRequest(format!("Menu item {id} does not exist"))
            }
            DashboardError::UnavailableMenuItem(id) => {
                ApiError::Conflict(format!("Menu item {id} is not available"))
            }
            DashboardError::Store(StoreError::NotFound) => ApiError::NotFound("Record".to_string()),
            DashboardError::Store(StoreError::ForeignKey(table)) => {
                ApiError::Conflict(format!("Foreign key constraint on {table} violated"))
            }
            DashboardError::Store(StoreError::Constraint(constraint)) => {
                ApiError::BadRequest(format!("Value rejected by {constraint}"))
            }
            DashboardError::Store(err @ (StoreError::Connection(_) | StoreError::Unavailable(_))) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            DashboardError::Store(err @ StoreError::Query(_)) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use diner_dashboard_service::store::RecordKind;
    use uuid::Uuid;

    #[test]
    fn test_missing_rows_map_to_not_found() {
        let err = ApiError::for_resource("Category", DashboardError::Store(StoreError::NotFound));
        assert_eq!(err.to_string(), "Category not found");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_menu_item_is_bad_request() {
        let err = ApiError::from(DashboardError::UnknownMenuItem(Uuid::nil()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failures_map_to_server_errors() {
        let unavailable =
            ApiError::from(DashboardError::Store(StoreError::Unavailable(RecordKind::Order)));
        assert_eq!(
            unavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let conflict = ApiError::for_resource(
            "Category",
            DashboardError::Store(StoreError::ForeignKey("menu_items".to_string())),
        );
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_rejected_values_are_client_errors() {
        let negative_price = ApiError::for_resource(
            "Menu item",
            DashboardError::Store(StoreError::Constraint(
                "menu_items_price_check".to_string(),
            )),
        );
        assert_eq!(
            negative_price.to_string(),
            "Bad request: Value rejected by menu_items_price_check"
        );
        assert_eq!(
            negative_price.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let unavailable = ApiError::from(DashboardError::UnavailableMenuItem(Uuid::nil()));
        assert_eq!(unavailable.into_response().status(), StatusCode::CONFLICT);
    }
}
