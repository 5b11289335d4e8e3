use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Uniform envelope for every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shapes() {
        let ok = ApiResponse::success(7);
        assert!(ok.success);
        assert_eq!(ok.data, Some(7));
        assert_eq!(ok.message, None);

        let err = ApiResponse::<()>::error("boom");
        assert!(!err.success);
        assert_eq!(err.message.as_deref(), Some("boom"));
    }
}
