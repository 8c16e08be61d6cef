//! 통합 API 에러 타입.
//!
//! 모든 도메인 실패는 [`AuthError`]의 닫힌 variant 집합으로 표현되고,
//! 핸들러 경계에서 일관된 `{code, message}` JSON 응답으로 변환됩니다.
//! 에러 종류는 variant로 구분하며, 메시지 문자열 검사는 하지 않습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 인증 도메인 에러.
///
/// 모든 variant는 400으로 매핑되며 `Internal`만 500으로 처리됩니다.
/// 발생 지점에서 생성되어 변형 없이 핸들러 경계까지 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 요청 본문 필드 제약 위반
    #[error("{0}")]
    Validation(String),

    /// 이미 등록된 이메일로 재가입 시도
    #[error("이미 존재하는 이메일입니다.")]
    DuplicateEmail,

    /// 비밀번호 불일치 또는 저장된 Refresh Token과 불일치
    #[error("{0}")]
    InvalidCredentials(String),

    /// Authorization 헤더 누락 또는 "Bearer " 접두사 없음
    #[error("유효하지 않은 인증 헤더입니다.")]
    InvalidAuthHeader,

    /// 서명/만료 검증 실패
    #[error("유효하지 않은 토큰입니다.")]
    InvalidToken,

    /// 참조된 사용자가 존재하지 않음
    #[error("{0}")]
    NotFound(String),

    /// 구현되지 않은 OAuth2 provider
    #[error("지원하지 않는 OAuth2 Provider입니다: {0}")]
    UnsupportedProvider(String),

    /// OAuth2 provider 검증 호출 실패 (네트워크 오류, 비정상 응답 포함)
    #[error("{0}")]
    UpstreamVerification(String),

    /// 그 외 모든 실패. 상세 내용은 서버 로그에만 남긴다.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// 클라이언트에 노출되는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            AuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::NotFound(_) => "USER_NOT_FOUND",
            AuthError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            AuthError::UpstreamVerification(_) => "OAUTH2_VERIFICATION_FAILED",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<crate::auth::JwtError> for AuthError {
    fn from(err: crate::auth::JwtError) -> Self {
        AuthError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match &self {
            AuthError::Internal(err) => {
                tracing::error!("Unexpected error: {err:#}");
                "서버 오류가 발생했습니다.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiErrorResponse::new(code, message))).into_response()
    }
}

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "DUPLICATE_EMAIL",
///   "message": "이미 존재하는 이메일입니다.",
///   "timestamp": 1754438400
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_TOKEN", "DUPLICATE_EMAIL")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_bad_request() {
        let errors = vec![
            AuthError::Validation("입력값이 올바르지 않습니다.".into()),
            AuthError::DuplicateEmail,
            AuthError::InvalidCredentials("비밀번호가 일치하지 않습니다.".into()),
            AuthError::InvalidAuthHeader,
            AuthError::InvalidToken,
            AuthError::NotFound("사용자를 찾을 수 없습니다.".into()),
            AuthError::UnsupportedProvider("APPLE".into()),
            AuthError::UpstreamVerification("Google 토큰 검증에 실패했습니다.".into()),
        ];

        for error in errors {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_internal_error_maps_to_server_error() {
        let error = AuthError::Internal(anyhow::anyhow!("connection pool exhausted"));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.code(), "INTERNAL_ERROR");

        // 내부 상세는 응답 메시지에 노출되지 않음
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AuthError::DuplicateEmail.code(), "DUPLICATE_EMAIL");
        assert_eq!(AuthError::InvalidToken.code(), "INVALID_TOKEN");
        assert_eq!(AuthError::InvalidAuthHeader.code(), "INVALID_AUTH_HEADER");
        assert_eq!(
            AuthError::UnsupportedProvider("APPLE".into()).code(),
            "UNSUPPORTED_PROVIDER"
        );
    }

    #[test]
    fn test_api_error_response_serialization() {
        let error = ApiErrorResponse::new("NOT_FOUND", "사용자를 찾을 수 없습니다.");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains(r#""code":"NOT_FOUND""#));
        assert!(json.contains("timestamp"));
    }
}
