//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains all request/response structures used by the API.

pub mod comment;
pub mod feedback;
pub mod forecast;
pub mod price;
pub mod ticket;
pub mod transcription;

// Re-export commonly used types
pub use comment::*;
pub use feedback::*;
pub use forecast::*;
pub use price::*;
pub use ticket::*;
pub use transcription::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            warning: None,
        }
    }

    /// Attach a warning without demoting the response
    ///
    /// Used when the vendor call succeeded but the database write did not;
    /// the caller still gets the result and a 200.
    pub fn with_warning(mut self, warning: Option<impl Into<String>>) -> Self {
        self.warning = warning.map(Into::into);
        self
    }
}

/// Per-item outcome of a batch operation
///
/// Batches never abort part-way: each item lands here as a success or a
/// failure and the batch as a whole returns 200.
#[derive(Serialize)]
pub struct BatchItemResult<T: Serialize> {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T: Serialize> BatchItemResult<T> {
    pub fn ok(index: usize, data: T, warning: Option<String>) -> Self {
        Self {
            index,
            success: true,
            data: Some(data),
            error: None,
            warning,
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            index,
            success: false,
            data: None,
            error: Some(error.into()),
            warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_envelope_shape() {
        let resp = SuccessResponse::with_data("Saved.", 7);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Saved.");
        assert_eq!(json["data"], 7);
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_warning_survives_serialization() {
        let resp = SuccessResponse::with_data("Analyzed.", 7)
            .with_warning(Some("analysis was not saved"));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["warning"], "analysis was not saved");
    }

    #[test]
    fn test_batch_item_failure_shape() {
        let item: BatchItemResult<i32> = BatchItemResult::failed(3, "upstream timeout");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "upstream timeout");
        assert!(json.get("data").is_none());
    }
}
