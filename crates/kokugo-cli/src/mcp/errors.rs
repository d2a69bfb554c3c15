//! Error handling utilities for MCP server

use kokugo_core::PlannerError;
use rmcp::ErrorData;

/// Converts session errors to MCP errors.
///
/// Input problems the caller can fix are reported as invalid parameters;
/// everything else is an internal error.
pub fn to_mcp_error(message: &str, error: &PlannerError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        PlannerError::InvalidInput { .. }
        | PlannerError::MissingCategory
        | PlannerError::MissingResult
        | PlannerError::PlanNotFound { .. }
        | PlannerError::ModelNotFound { .. } => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;

    #[test]
    fn test_missing_category_is_invalid_params() {
        let error = to_mcp_error("Failed to generate plan", &PlannerError::MissingCategory);
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert!(error.message.starts_with("Failed to generate plan: "));
    }

    #[test]
    fn test_generation_failure_is_internal() {
        let error = to_mcp_error(
            "Failed to generate plan",
            &PlannerError::generation("timeout"),
        );
        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
    }
}
