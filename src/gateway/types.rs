use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::AccountId;
use crate::error::LedgerError;
use crate::money::{self, MoneyError};
use crate::store::StoreError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - status: "success" or "failed"
/// - message: short human-readable outcome
/// - error: machine-readable kind, only on failure
/// - data: payload, only on success
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// "success" | "failed"
    #[schema(example = "success")]
    pub status: &'static str,
    /// Outcome description
    #[schema(example = "Transaction completed successfully")]
    pub message: String,
    /// Error kind (only present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub error: Option<&'static str>,
    /// Response data (only present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            error: None,
            data: Some(data),
        }
    }

    /// Create failure response
    pub fn failure(error: &'static str, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            status: "failed",
            message: message.into(),
            error: Some(error),
            data: None,
        }
    }
}

/// Domain error adapted to an HTTP response.
///
/// Handlers and middleware return this; `?` converts from the domain
/// error types.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e.into())
    }
}

impl From<MoneyError> for ApiError {
    fn from(e: MoneyError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiResponse::<()>::failure(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// Handler result: explicit status code plus enveloped body
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 with a success envelope
pub fn ok<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(message, data))))
}

/// 200 with a success envelope and no data payload
pub fn ok_message(message: impl Into<String>) -> ApiResult<()> {
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            status: "success",
            message: message.into(),
            error: None,
            data: None,
        }),
    ))
}

/// 201 with a success envelope
pub fn created<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message, data))))
}

// ============================================================================
// StrictAmount: Format-Validated Amount at Serde Layer
// ============================================================================

/// Strict format amount - validates format during deserialization
///
/// Accepts a JSON string or number and applies the [`crate::money`]
/// rules at the Serde layer:
/// - Rejects `.5` (must be `0.5`) and `5.` (must be `5.0` or `5`)
/// - Rejects zero, negative, and more than 2 fractional digits
/// - Rejects empty strings
///
/// A deserialized `StrictAmount` is always a valid transfer amount.
#[derive(Debug, Clone, Copy)]
pub struct StrictAmount(Decimal);

impl StrictAmount {
    /// Get the inner Decimal value
    pub fn inner(self) -> Decimal {
        self.0
    }
}

impl std::ops::Deref for StrictAmount {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StrictAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // Accepts either a JSON string or a bare JSON number
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        let value = DecimalOrString::deserialize(deserializer)?;

        match value {
            DecimalOrString::String(s) => {
                let d = money::parse_amount(&s).map_err(D::Error::custom)?;
                Ok(StrictAmount(d))
            }
            DecimalOrString::Number(d) => {
                // Already a Decimal; still subject to the same bounds
                money::validate_amount(d).map_err(D::Error::custom)?;
                Ok(StrictAmount(d))
            }
        }
    }
}

impl Serialize for StrictAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Emitted as a string so clients never touch floats
        serializer.serialize_str(&money::format_amount(self.0))
    }
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Peer transfer request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Source account id (must belong to the caller)
    #[schema(value_type = String, example = "01JH6ME9AV0SR9Y2J7NANJD1Z3")]
    pub from_account: AccountId,
    /// Destination account id (must belong to the caller)
    #[schema(value_type = String, example = "01JH6MEB95W1TC8Y4V0QGPT8KD")]
    pub to_account: AccountId,
    /// Amount, string or number - format validated by StrictAmount
    #[schema(value_type = String, example = "300.00")]
    pub amount: StrictAmount,
    /// Client-chosen retry token, 1..=64 chars
    #[schema(example = "rent-2026-08")]
    pub idempotency_key: String,
}

/// System funding request (source account is resolved from the system
/// user's own accounts)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemFundingRequest {
    /// Destination account id
    #[schema(value_type = String, example = "01JH6ME9AV0SR9Y2J7NANJD1Z3")]
    pub to_account: AccountId,
    /// Amount, string or number - format validated by StrictAmount
    #[schema(value_type = String, example = "1000")]
    pub amount: StrictAmount,
    /// Client-chosen retry token, 1..=64 chars
    #[schema(example = "welcome-01JH6ME9AV")]
    pub idempotency_key: String,
}

/// Derived balance response data
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    #[schema(value_type = String, example = "01JH6ME9AV0SR9Y2J7NANJD1Z3")]
    pub account_id: AccountId,
    /// Fixed two-decimal string
    #[schema(example = "700.00")]
    pub balance: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // =========================================================================
    // StrictAmount Tests
    // =========================================================================

    #[test]
    fn test_strict_amount_valid_string() {
        let d: StrictAmount = serde_json::from_str(r#""1.5""#).unwrap();
        assert_eq!(*d, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_strict_amount_valid_number() {
        let d: StrictAmount = serde_json::from_str(r#"1.5"#).unwrap();
        assert_eq!(*d, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_strict_amount_rejects_dot_prefix() {
        let result: Result<StrictAmount, _> = serde_json::from_str(r#"".5""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_strict_amount_rejects_dot_suffix() {
        let result: Result<StrictAmount, _> = serde_json::from_str(r#""5.""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_strict_amount_rejects_negative() {
        assert!(serde_json::from_str::<StrictAmount>(r#""-1.5""#).is_err());
        assert!(serde_json::from_str::<StrictAmount>(r#"-1.5"#).is_err());
    }

    #[test]
    fn test_strict_amount_rejects_zero() {
        assert!(serde_json::from_str::<StrictAmount>(r#""0.00""#).is_err());
        assert!(serde_json::from_str::<StrictAmount>(r#"0"#).is_err());
    }

    #[test]
    fn test_strict_amount_rejects_excess_precision() {
        assert!(serde_json::from_str::<StrictAmount>(r#""1.234""#).is_err());
        assert!(serde_json::from_str::<StrictAmount>(r#"1.234"#).is_err());
    }

    #[test]
    fn test_strict_amount_serializes_fixed_scale() {
        let d: StrictAmount = serde_json::from_str(r#""300""#).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), r#""300.00""#);
    }

    // =========================================================================
    // Envelope Tests
    // =========================================================================

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success("Account created successfully", 42u32);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Account created successfully");
        assert_eq!(json["data"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_message_only_envelope_shape() {
        let (status, body) = ok_message("User logged out successfully").unwrap();
        assert_eq!(status, StatusCode::OK);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "User logged out successfully");
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let err = LedgerError::AccountNotFound;
        let resp = ApiResponse::<()>::failure(err.code(), err.to_string());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "ACCOUNT_NOT_FOUND");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_transaction_request_wire_names() {
        let json = r#"{
            "fromAccount": "01JH6ME9AV0SR9Y2J7NANJD1Z3",
            "toAccount": "01JH6MEB95W1TC8Y4V0QGPT8KD",
            "amount": "300.00",
            "idempotencyKey": "rent-2026-08"
        }"#;
        let req: TransactionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.idempotency_key, "rent-2026-08");
        assert_eq!(req.amount.inner(), Decimal::from(300));
    }

    #[test]
    fn test_transaction_request_rejects_bad_account_id() {
        let json = r#"{
            "fromAccount": "not-a-ulid",
            "toAccount": "01JH6MEB95W1TC8Y4V0QGPT8KD",
            "amount": "300.00",
            "idempotencyKey": "rent-2026-08"
        }"#;
        assert!(serde_json::from_str::<TransactionRequest>(json).is_err());
    }
}
