use serde::Serialize;
use utoipa::ToSchema;

/// Paging info attached to list responses; single-resource responses leave it empty.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// Failure envelope. `error` is a stable machine-readable kind such as `stock_exceeded`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    pub error: &'static str,
}

impl ApiError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_serialize_with_success_flag() {
        let ok = serde_json::to_value(ApiResponse::success("OK", 7, Some(Meta::new(1, 20, 1)))).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["meta"]["per_page"], 20);

        let err = serde_json::to_value(ApiError::new("not_found", "Order not found")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "not_found");
    }
}
