//! Tripo error normalization.
//!
//! Tripo reports numeric error codes. Known codes map onto the shared
//! vocabulary; unknown codes degrade to `Other("TRIPO_{code}")` so the value
//! stays inspectable for codes added after this table was written. Lookups
//! never fail.

use crate::types::ErrorCode;

/// Map a Tripo numeric error code onto the shared vocabulary.
pub fn normalize_code(code: i64) -> ErrorCode {
    match code {
        1001 => ErrorCode::InvalidParameter,
        1002 => ErrorCode::AuthenticationFailed,
        2000 => ErrorCode::InvalidParameter,
        2001 => ErrorCode::TaskNotFound,
        2002 => ErrorCode::RateLimited,
        2004 => ErrorCode::InsufficientCredits,
        2006 => ErrorCode::ServerError,
        2008 => ErrorCode::ContentPolicyViolation,
        other => ErrorCode::Other(format!("TRIPO_{other}")),
    }
}

/// Shared code for an HTTP-level rejection that carried no body code.
pub fn code_for_http_status(status: u16) -> ErrorCode {
    match status {
        401 | 403 => ErrorCode::AuthenticationFailed,
        402 => ErrorCode::InsufficientCredits,
        429 => ErrorCode::RateLimited,
        500..=599 => ErrorCode::ServerError,
        other => ErrorCode::Other(format!("HTTP_{other}")),
    }
}

/// Secondary mapping from a terminal vendor status to an error, used when the
/// status payload carries no explicit error code. Returns the shared code and
/// a fixed default message.
pub fn code_for_terminal_status(status: &str) -> Option<(ErrorCode, &'static str)> {
    match status {
        "banned" => Some((
            ErrorCode::ContentPolicyViolation,
            "the task was rejected by the content moderation system",
        )),
        "expired" => Some((
            ErrorCode::TaskExpired,
            "the task expired before it completed",
        )),
        "cancelled" => Some((ErrorCode::TaskCanceled, "the task was canceled")),
        "failed" => Some((
            ErrorCode::GenerationFailed,
            "the vendor reported a generation failure",
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_round_trip() {
        assert_eq!(normalize_code(1002), ErrorCode::AuthenticationFailed);
        assert_eq!(normalize_code(2001), ErrorCode::TaskNotFound);
        assert_eq!(normalize_code(2004), ErrorCode::InsufficientCredits);
        assert_eq!(normalize_code(2008), ErrorCode::ContentPolicyViolation);
    }

    #[test]
    fn unknown_codes_degrade_without_losing_the_value() {
        let code = normalize_code(9999);
        assert_eq!(code, ErrorCode::Other("TRIPO_9999".to_string()));
        assert!(!code.as_str().is_empty());
    }

    #[test]
    fn terminal_status_fallbacks() {
        let (code, message) = code_for_terminal_status("banned").unwrap();
        assert_eq!(code, ErrorCode::ContentPolicyViolation);
        assert!(!message.is_empty());

        let (code, _) = code_for_terminal_status("expired").unwrap();
        assert_eq!(code, ErrorCode::TaskExpired);

        assert!(code_for_terminal_status("success").is_none());
        assert!(code_for_terminal_status("running").is_none());
    }
}
