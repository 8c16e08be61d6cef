//! 인증 API.
//!
//! # 엔드포인트
//!
//! - `POST /api/auth/register` - 일반 회원가입
//! - `POST /api/auth/login` - 일반 로그인
//! - `POST /api/auth/refresh` - Access Token 갱신 (Authorization: Bearer <refreshToken>)
//! - `GET /api/auth/me` - 현재 사용자 조회 (Authorization: Bearer <accessToken>)
//! - `POST /api/auth/logout` - 로그아웃 (저장된 Refresh Token 해제)
//! - `POST /api/auth/oauth2/login` - OAuth2 provider 토큰으로 로그인
//!
//! 모든 도메인 실패는 `{code, message}` 형식의 400 응답으로 매핑됩니다.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AuthError;
use crate::repository::{ProviderType, User};
use crate::state::AppState;

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    /// 이메일 (유일해야 함)
    #[validate(
        email(message = "유효한 이메일 형식이 아닙니다"),
        length(min = 1, max = 320, message = "이메일은 필수입니다")
    )]
    pub email: String,
    /// 비밀번호 (8자 이상 100자 이하)
    #[validate(length(min = 8, max = 100, message = "비밀번호는 8자 이상 100자 이하여야 합니다"))]
    pub password: String,
    /// 표시 이름
    #[validate(length(min = 1, max = 100, message = "이름은 1자 이상 100자 이하여야 합니다"))]
    pub name: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(
        email(message = "유효한 이메일 형식이 아닙니다"),
        length(min = 1, max = 320, message = "이메일은 필수입니다")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호는 필수입니다"))]
    pub password: String,
}

/// OAuth2 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OAuth2LoginRequest {
    /// OAuth2 provider 종류 (예: "GOOGLE")
    pub provider: ProviderType,
    /// provider가 발급한 원본 토큰
    #[validate(length(min = 1, message = "토큰은 필수입니다"))]
    pub token: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// 토큰 갱신 응답.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// 갱신 요청에 사용된 Refresh Token 그대로 (회전하지 않음)
    pub refresh_token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// 일반 회원가입.
///
/// `POST /api/auth/register`
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "가입 완료", body = User),
        (status = 400, description = "이메일 중복 또는 입력값 오류", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignUpRequest>,
) -> Result<impl IntoResponse, AuthError> {
    validate(&payload)?;

    let user = state
        .auth
        .register_local(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// 일반 로그인.
///
/// `POST /api/auth/login`
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "자격 증명 오류", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    validate(&payload)?;

    let (pair, user) = state
        .auth
        .login_local(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user,
    }))
}

/// Access Token 갱신.
///
/// `POST /api/auth/refresh`
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    params(
        ("Authorization" = String, Header, description = "Bearer <refreshToken>")
    ),
    responses(
        (status = 200, description = "갱신 성공", body = TokenResponse),
        (status = 400, description = "유효하지 않은 토큰", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AuthError> {
    let pair = state.auth.refresh(auth_header(&headers)).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// 현재 사용자 조회.
///
/// `GET /api/auth/me`
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    params(
        ("Authorization" = Option<String>, Header, description = "Bearer <accessToken>")
    ),
    responses(
        (status = 200, description = "조회 성공", body = User),
        (status = 400, description = "유효하지 않은 토큰", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, AuthError> {
    let user = state.auth.current_user(auth_header(&headers)).await?;
    Ok(Json(user))
}

/// 로그아웃.
///
/// `POST /api/auth/logout`
///
/// 저장된 Refresh Token만 해제합니다. 이미 발급된 Access Token은
/// 만료 전까지 유효합니다.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    params(
        ("Authorization" = Option<String>, Header, description = "Bearer <accessToken>")
    ),
    responses(
        (status = 200, description = "로그아웃 완료"),
        (status = 400, description = "유효하지 않은 토큰", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    state.auth.logout(auth_header(&headers)).await?;
    Ok(StatusCode::OK)
}

/// OAuth2 로그인.
///
/// `POST /api/auth/oauth2/login`
///
/// provider 토큰을 검증한 뒤 해당 신원으로 로그인(또는 최초 로그인 시
/// 계정 생성)합니다.
#[utoipa::path(
    post,
    path = "/api/auth/oauth2/login",
    tag = "auth",
    request_body = OAuth2LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "토큰 검증 실패 또는 미지원 provider", body = crate::error::ApiErrorResponse)
    )
)]
pub async fn oauth2_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OAuth2LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    validate(&payload)?;

    let identity = state
        .verifier
        .verify(&payload.token, payload.provider)
        .await?;

    let (pair, user) = state.auth.oauth2_login(payload.provider, identity).await?;

    Ok(Json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user,
    }))
}

/// 인증 라우터.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route("/oauth2/login", post(oauth2_login))
}

/// 요청 본문 검증.
///
/// 필드 제약 위반은 항목과 무관하게 동일한 일반 메시지로 응답한다.
fn validate<T: Validate>(payload: &T) -> Result<(), AuthError> {
    payload
        .validate()
        .map_err(|e| {
            tracing::debug!("요청 본문 검증 실패: {}", e);
            AuthError::Validation("입력값이 올바르지 않습니다.".to_string())
        })
}

/// Authorization 헤더 값 추출 (없거나 ASCII가 아니면 None).
fn auth_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}
