//! Hunyuan error normalization.
//!
//! Vendor codes are dotted strings (`Category.Detail`). Lookup tries an exact
//! match first, then the `Category` prefix, and finally passes the raw code
//! through unmodified so nothing is dropped when the vendor adds codes.

use crate::types::ErrorCode;

/// Map a Hunyuan dotted error code onto the shared vocabulary.
pub fn normalize_code(code: &str) -> ErrorCode {
    if let Some(mapped) = exact(code) {
        return mapped;
    }
    if let Some((category, _)) = code.split_once('.')
        && let Some(mapped) = category_fallback(category)
    {
        return mapped;
    }
    if let Some(mapped) = category_fallback(code) {
        return mapped;
    }
    ErrorCode::Other(code.to_string())
}

fn exact(code: &str) -> Option<ErrorCode> {
    let mapped = match code {
        "AuthFailure.SignatureExpire"
        | "AuthFailure.SignatureFailure"
        | "AuthFailure.SecretIdNotFound"
        | "AuthFailure.TokenFailure" => ErrorCode::AuthenticationFailed,
        "FailedOperation.ArrearsError" => ErrorCode::InsufficientCredits,
        "FailedOperation.ImageDecodeFailed" => ErrorCode::InvalidParameter,
        "FailedOperation.ImageIllegalDetected" => ErrorCode::ContentPolicyViolation,
        "FailedOperation.JobNotExist" => ErrorCode::TaskNotFound,
        "InvalidParameter.JsonParseError" => ErrorCode::InvalidParameter,
        "RequestLimitExceeded.JobNumExceed" => ErrorCode::RateLimited,
        _ => return None,
    };
    Some(mapped)
}

fn category_fallback(category: &str) -> Option<ErrorCode> {
    let mapped = match category {
        "AuthFailure" | "UnauthorizedOperation" => ErrorCode::AuthenticationFailed,
        "FailedOperation" => ErrorCode::GenerationFailed,
        "InvalidParameter" | "InvalidParameterValue" | "MissingParameter" => {
            ErrorCode::InvalidParameter
        }
        "RequestLimitExceeded" | "LimitExceeded" => ErrorCode::RateLimited,
        "InternalError" | "ResourceUnavailable" => ErrorCode::ServerError,
        _ => return None,
    };
    Some(mapped)
}

/// Secondary mapping from a terminal job status to an error, used when the
/// query payload carries no explicit error code.
pub fn code_for_terminal_status(status: &str) -> Option<(ErrorCode, &'static str)> {
    match status {
        "FAIL" => Some((
            ErrorCode::GenerationFailed,
            "the generation job failed",
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_win() {
        assert_eq!(
            normalize_code("FailedOperation.ArrearsError"),
            ErrorCode::InsufficientCredits
        );
        assert_eq!(
            normalize_code("FailedOperation.ImageIllegalDetected"),
            ErrorCode::ContentPolicyViolation
        );
        assert_eq!(
            normalize_code("AuthFailure.SignatureExpire"),
            ErrorCode::AuthenticationFailed
        );
    }

    #[test]
    fn unknown_detail_falls_back_to_category() {
        assert_eq!(
            normalize_code("FailedOperation.SomethingNew"),
            ErrorCode::GenerationFailed
        );
        assert_eq!(
            normalize_code("InvalidParameterValue.Whatever"),
            ErrorCode::InvalidParameter
        );
        assert_eq!(
            normalize_code("InternalError.Timeout"),
            ErrorCode::ServerError
        );
    }

    #[test]
    fn bare_category_codes_map_too() {
        assert_eq!(normalize_code("InvalidParameter"), ErrorCode::InvalidParameter);
        assert_eq!(normalize_code("RequestLimitExceeded"), ErrorCode::RateLimited);
    }

    #[test]
    fn unrecognized_codes_pass_through() {
        let code = normalize_code("BrandNewCategory.Detail");
        assert_eq!(
            code,
            ErrorCode::Other("BrandNewCategory.Detail".to_string())
        );
        assert!(!code.as_str().is_empty());
    }

    #[test]
    fn terminal_status_fallback() {
        let (code, message) = code_for_terminal_status("FAIL").unwrap();
        assert_eq!(code, ErrorCode::GenerationFailed);
        assert!(!message.is_empty());
        assert!(code_for_terminal_status("DONE").is_none());
    }
}
