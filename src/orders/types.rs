//! Order request/response types and the error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::request::TraceId;

/// Order ID used when the query omits `order_id`.
pub const DEFAULT_ORDER_ID: &str = "unknown";

/// Order ID that always fails validation.
const REJECTED_ORDER_ID: &str = "invalid";

/// Failure forced by the caller through the `error` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedError {
    Db,
    ApiTimeout,
}

impl SimulatedError {
    /// Parse the `error` query value. Unrecognized values mean no override.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value? {
            "db" => Some(SimulatedError::Db),
            "api_timeout" => Some(SimulatedError::ApiTimeout),
            _ => None,
        }
    }
}

/// Query parameters of `GET /process_order`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    pub order_id: Option<String>,
    pub error: Option<String>,
}

impl OrderQuery {
    /// Collect the known parameters from decoded query pairs. The first
    /// occurrence of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "order_id" => &mut query.order_id,
                "error" => &mut query.error,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// A validated-shape order request. Contents are checked by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub order_id: String,
    pub simulated_error: Option<SimulatedError>,
}

impl OrderRequest {
    pub fn new(order_id: impl Into<String>, simulated_error: Option<SimulatedError>) -> Self {
        Self {
            order_id: order_id.into(),
            simulated_error,
        }
    }

    pub fn is_valid_id(&self) -> bool {
        !self.order_id.is_empty() && self.order_id != REJECTED_ORDER_ID
    }
}

impl From<OrderQuery> for OrderRequest {
    fn from(query: OrderQuery) -> Self {
        Self {
            order_id: query.order_id.unwrap_or_else(|| DEFAULT_ORDER_ID.to_string()),
            simulated_error: SimulatedError::parse(query.error.as_deref()),
        }
    }
}

/// Body of a successful `GET /process_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub trace_id: TraceId,
    pub order_id: String,
    pub status: String,
}

impl OrderResult {
    pub fn processed(trace_id: TraceId, order_id: String) -> Self {
        Self {
            trace_id,
            order_id,
            status: "processed".to_string(),
        }
    }
}

/// Classified order processing failure.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Invalid order_id")]
    Validation,

    #[error("Failed to connect to database")]
    DatabaseConnection,

    #[error("Third-party API timeout after 5s")]
    ThirdPartyTimeout,

    #[error("{0}")]
    Unexpected(String),
}

impl OrderError {
    /// Value of the `error_type` label and log field.
    pub fn error_type(&self) -> &'static str {
        match self {
            OrderError::Validation => "ValidationError",
            OrderError::DatabaseConnection => "DatabaseConnectionError",
            OrderError::ThirdPartyTimeout => "ThirdPartyTimeout",
            OrderError::Unexpected(_) => "UnexpectedError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            OrderError::Validation => 400,
            OrderError::DatabaseConnection | OrderError::ThirdPartyTimeout => 503,
            OrderError::Unexpected(_) => 500,
        }
    }

    /// True for failures of a simulated dependency.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, OrderError::DatabaseConnection | OrderError::ThirdPartyTimeout)
    }

    /// Whether this failure is reported to the cluster as an event.
    /// Client mistakes are not.
    pub fn warrants_cluster_event(&self) -> bool {
        self.is_dependency_failure() || matches!(self, OrderError::Unexpected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_error_parse() {
        assert_eq!(SimulatedError::parse(Some("db")), Some(SimulatedError::Db));
        assert_eq!(SimulatedError::parse(Some("api_timeout")), Some(SimulatedError::ApiTimeout));
        assert_eq!(SimulatedError::parse(Some("DB")), None);
        assert_eq!(SimulatedError::parse(Some("")), None);
        assert_eq!(SimulatedError::parse(None), None);
    }

    #[test]
    fn test_query_conversion_defaults_missing_order_id() {
        let request = OrderRequest::from(OrderQuery::default());
        assert_eq!(request.order_id, DEFAULT_ORDER_ID);
        assert!(request.is_valid_id());

        let request = OrderRequest::from(OrderQuery {
            order_id: Some(String::new()),
            error: Some("api_timeout".into()),
        });
        assert!(!request.is_valid_id());
        assert_eq!(request.simulated_error, Some(SimulatedError::ApiTimeout));
    }

    #[test]
    fn test_first_occurrence_of_repeated_key_wins() {
        let pairs = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        };

        let query = OrderQuery::from_pairs(pairs(&[("order_id", "a"), ("order_id", "b")]));
        assert_eq!(query.order_id.as_deref(), Some("a"));
        assert_eq!(query.error, None);

        let query = OrderQuery::from_pairs(pairs(&[
            ("order_id", "a"),
            ("error", "db"),
            ("error", "api_timeout"),
            ("page", "2"),
        ]));
        assert_eq!(
            query,
            OrderQuery {
                order_id: Some("a".into()),
                error: Some("db".into()),
            }
        );

        // An empty first value still wins over a later non-empty one.
        let query = OrderQuery::from_pairs(pairs(&[("order_id", ""), ("order_id", "b")]));
        assert_eq!(query.order_id.as_deref(), Some(""));
        assert!(OrderQuery::from_pairs(Vec::<(String, String)>::new()).order_id.is_none());
    }

    #[test]
    fn test_cluster_event_classification() {
        assert!(!OrderError::Validation.warrants_cluster_event());
        assert!(OrderError::DatabaseConnection.warrants_cluster_event());
        assert!(OrderError::ThirdPartyTimeout.warrants_cluster_event());
        assert!(OrderError::Unexpected("x".into()).warrants_cluster_event());
        assert!(!OrderError::Unexpected("x".into()).is_dependency_failure());
    }

    #[test]
    fn test_invalid_literal_is_rejected() {
        assert!(!OrderRequest::new("invalid", None).is_valid_id());
        assert!(OrderRequest::new("invalid-2", None).is_valid_id());
    }

    #[test]
    fn test_classification_table() {
        let cases = [
            (OrderError::Validation, "ValidationError", 400),
            (OrderError::DatabaseConnection, "DatabaseConnectionError", 503),
            (OrderError::ThirdPartyTimeout, "ThirdPartyTimeout", 503),
            (OrderError::Unexpected("boom".into()), "UnexpectedError", 500),
        ];
        for (err, error_type, status) in cases {
            assert_eq!(err.error_type(), error_type);
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(OrderError::Validation.to_string(), "Invalid order_id");
        assert_eq!(OrderError::DatabaseConnection.to_string(), "Failed to connect to database");
        assert_eq!(OrderError::ThirdPartyTimeout.to_string(), "Third-party API timeout after 5s");
    }
}
