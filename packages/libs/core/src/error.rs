//! 공통 에러 타입
//!
//! 규칙 코덱, 필터, 정책 모델에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Rulekeep 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Codec Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unsupported rule arity for '{ptype}': {arity} fields (max {max})")]
    UnsupportedArity {
        ptype: String,
        arity: usize,
        max: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Model Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("malformed policy line '{line}': {reason}")]
    MalformedLine { line: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Filter Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("invalid filter type: {message}")]
    InvalidFilterType { message: String },
}

impl Error {
    /// 에러 코드 (호출자용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedArity { .. } => "UNSUPPORTED_ARITY",
            Error::MalformedLine { .. } => "MALFORMED_LINE",
            Error::InvalidFilterType { .. } => "INVALID_FILTER_TYPE",
        }
    }

    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Error::MalformedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
