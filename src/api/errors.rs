use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::{OrderError, OrderId};
use crate::views::ViewError;

// ============================================================================
// API Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ViewError> for ApiError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::UnknownOrder(id) => ApiError::NotFound(id),
            ViewError::Rejected(e) => ApiError::Order(e),
            other @ (ViewError::NoAction(_) | ViewError::NotInView { .. }) => {
                ApiError::Conflict(other.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Order(OrderError::IllegalTransition { .. } | OrderError::AlreadyInStatus(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::Order(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound(OrderId::from("1")).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(OrderError::IllegalTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending,
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(OrderError::EmptyItems).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_view_errors_map() {
        let err = ApiError::from(ViewError::UnknownOrder(OrderId::from("x")));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from(ViewError::NoAction(OrderStatus::Cancelled));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "no action available in the cancelled view");
    }
}
