//! Classification of failed claims.
//!
//! The program reports rejections as Anchor custom errors. When the cluster
//! returns a structured code it is looked up in the IDL; otherwise the error
//! text is matched against known substrings. Either way every limit-style
//! rejection collapses into one user-facing message.

use serde_json::Value;

use crate::error::FaucetError;
use crate::idl::Idl;

/// The single message shown for any limit, cooldown or vault-exhaustion rejection.
pub const LIMIT_REACHED_MESSAGE: &str = "Claim limit reached. Please try again later.";

const LIMIT_MARKERS: [&str; 3] = ["limit", "cooldown", "insufficient"];

/// How a failed claim is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimRejection {
    /// The program refused the claim; `code` is set when it was structured.
    LimitReached { code: Option<u32> },
    /// Anything else, carrying the raw error text.
    Other(String),
}

impl ClaimRejection {
    pub fn message(&self) -> String {
        match self {
            Self::LimitReached { .. } => LIMIT_REACHED_MESSAGE.to_string(),
            Self::Other(raw) => raw.clone(),
        }
    }
}

/// Extract an Anchor custom error code from RPC error data or error text.
pub fn custom_error_code(err: &FaucetError) -> Option<u32> {
    if let FaucetError::Rpc { data: Some(data), .. } = err {
        let tx_err = data.get("err").unwrap_or(data);
        if let Some(code) = instruction_custom_code(tx_err) {
            return Some(code);
        }
    }
    if let FaucetError::TransactionFailed { reason, .. } = err {
        if let Ok(value) = serde_json::from_str::<Value>(reason) {
            if let Some(code) = instruction_custom_code(&value) {
                return Some(code);
            }
        }
    }
    hex_code_in_text(&err.to_string())
}

/// `{"InstructionError": [index, {"Custom": code}]}`
fn instruction_custom_code(value: &Value) -> Option<u32> {
    value
        .get("InstructionError")?
        .get(1)?
        .get("Custom")?
        .as_u64()
        .and_then(|c| u32::try_from(c).ok())
}

/// `custom program error: 0x1770`
fn hex_code_in_text(text: &str) -> Option<u32> {
    const MARKER: &str = "custom program error: 0x";
    let start = text.find(MARKER)? + MARKER.len();
    let digits: String = text[start..].chars().take_while(|c| c.is_ascii_hexdigit()).collect();
    u32::from_str_radix(&digits, 16).ok()
}

fn is_limit_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    LIMIT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classify a claim failure against the program's IDL errors.
pub fn classify(err: &FaucetError, idl: &Idl) -> ClaimRejection {
    if let Some(code) = custom_error_code(err) {
        if let Some(program_error) = idl.error(code) {
            let described = format!(
                "{} {}",
                program_error.name,
                program_error.msg.as_deref().unwrap_or_default()
            );
            if is_limit_text(&described) {
                return ClaimRejection::LimitReached { code: Some(code) };
            }
        }
    }

    let raw = err.to_string();
    if is_limit_text(&raw) {
        return ClaimRejection::LimitReached { code: None };
    }
    ClaimRejection::Other(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn idl() -> Idl {
        Idl::faucet().unwrap()
    }

    fn rpc(message: &str, data: Option<Value>) -> FaucetError {
        FaucetError::Rpc { code: -32002, message: message.to_string(), data }
    }

    #[test]
    fn test_structured_cooldown_code() {
        let err = rpc(
            "Transaction simulation failed: Error processing Instruction 0",
            Some(json!({ "err": { "InstructionError": [0, { "Custom": 6000 }] } })),
        );
        assert_eq!(custom_error_code(&err), Some(6000));
        assert_eq!(classify(&err, &idl()), ClaimRejection::LimitReached { code: Some(6000) });
    }

    #[test]
    fn test_hex_code_in_message() {
        let err = rpc("Error processing Instruction 0: custom program error: 0x1771", None);
        assert_eq!(custom_error_code(&err), Some(6001));
        assert_eq!(classify(&err, &idl()), ClaimRejection::LimitReached { code: Some(6001) });
    }

    #[test]
    fn test_failed_transaction_status() {
        let err = FaucetError::TransactionFailed {
            signature: "sig".to_string(),
            reason: r#"{"InstructionError":[0,{"Custom":6000}]}"#.to_string(),
        };
        assert_eq!(classify(&err, &idl()).message(), LIMIT_REACHED_MESSAGE);
    }

    #[test]
    fn test_cooldown_substring_fallback() {
        let err = rpc("Program log: Cooldown period has not elapsed yet", None);
        let rejection = classify(&err, &idl());
        assert_eq!(rejection, ClaimRejection::LimitReached { code: None });
        assert_eq!(rejection.message(), LIMIT_REACHED_MESSAGE);
        assert!(!rejection.message().contains("elapsed"));
    }

    #[test]
    fn test_limit_and_insufficient_substrings() {
        assert!(matches!(
            classify(&rpc("Daily LIMIT exceeded", None), &idl()),
            ClaimRejection::LimitReached { .. }
        ));
        assert!(matches!(
            classify(&rpc("insufficient funds in vault", None), &idl()),
            ClaimRejection::LimitReached { .. }
        ));
    }

    #[test]
    fn test_unknown_code_keeps_raw_message() {
        let err = rpc("custom program error: 0x1", None);
        assert_eq!(
            classify(&err, &idl()),
            ClaimRejection::Other("custom program error: 0x1".to_string())
        );
    }

    #[test]
    fn test_other_errors_surface_raw() {
        let err = FaucetError::Network { reason: "connection refused".to_string() };
        assert_eq!(
            classify(&err, &idl()).message(),
            "Network error: connection refused"
        );
    }
}
