//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::repository::{ProviderType, Role, User};
use crate::routes::{
    ComponentStatus, HealthResponse, LoginResponse, OAuth2LoginRequest, SignInRequest,
    SignUpRequest, TokenResponse,
};

/// Trader Auth API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trader Auth API",
        version = "0.1.0",
        description = r#"
# 트레이딩 봇 인증 REST API

일반(이메일/비밀번호) 및 OAuth2(Google) 로그인과 JWT 토큰 관리를 위한 API입니다.

## 토큰 모델

- Access Token: 짧은 수명, 사용자 ID/이메일/역할 클레임 포함
- Refresh Token: 긴 수명, 사용자당 마지막으로 발급된 하나만 유효
"#
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::me,
        crate::routes::auth::logout,
        crate::routes::auth::oauth2_login,
    ),
    components(schemas(
        User,
        ProviderType,
        Role,
        SignUpRequest,
        SignInRequest,
        OAuth2LoginRequest,
        LoginResponse,
        TokenResponse,
        ApiErrorResponse,
        HealthResponse,
        ComponentStatus,
    )),
    tags(
        (name = "auth", description = "인증 및 토큰 관리"),
        (name = "health", description = "헬스 체크")
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// `/swagger-ui`에서 UI를, `/api-docs/openapi.json`에서 스펙을 제공합니다.
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("/api/auth/register"));
        assert!(json.contains("/api/auth/oauth2/login"));
        assert!(json.contains("/health/ready"));
    }
}
