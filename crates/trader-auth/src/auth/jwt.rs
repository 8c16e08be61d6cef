//! JWT 토큰 발급/검증.
//!
//! Access Token과 Refresh Token은 하나의 공유 비밀 키로 HS256 서명됩니다.
//! 토큰은 자체 완결적(stateless)이며, 서버는 Refresh Token 한 개만
//! 사용자 레코드에 보관하여 갱신 시 폐기 여부를 판단합니다.
//! Access Token은 저장소와 대조하지 않으므로 로그아웃 후에도 만료 전까지
//! 유효합니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::JwtSettings;
use crate::repository::Role;

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 사용자 이메일
    pub email: String,
    /// 사용자 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
}

/// Refresh Token 페이로드.
///
/// Access Token 갱신에만 사용되므로 subject 외의 신원 정보는 담지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// Issued At
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// JWT ID
    pub jti: String,
}

/// 검증용 최소 페이로드.
///
/// Access/Refresh 어느 쪽이든 공통으로 갖는 클레임만 읽는다.
#[derive(Debug, Deserialize)]
struct BaseClaims {
    sub: String,
    #[allow(dead_code)]
    exp: i64,
}

/// Access Token + Refresh Token 쌍.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// 토큰 발급/검증 서비스.
///
/// 생성 시 주입된 [`JwtSettings`]만 사용하며 내부 상태를 갖지 않습니다.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// 설정에서 토큰 서비스 생성.
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            access_ttl: Duration::seconds(settings.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(settings.refresh_token_ttl_secs),
        }
    }

    /// Access Token 발급.
    ///
    /// 클레임: subject(사용자 ID), email, role, iat, exp.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(JwtError::from)
    }

    /// Refresh Token 발급.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(JwtError::from)
    }

    /// 토큰 서명 및 만료 검증.
    ///
    /// 형식 오류, 서명 불일치, 만료 등 어떤 경우에도 에러를 던지지 않고
    /// `false`를 반환하며 실패 사유를 로그로 남깁니다.
    pub fn validate(&self, token: &str) -> bool {
        match decode::<BaseClaims>(token, &self.decoding_key, &Self::validation()) {
            Ok(_) => true,
            Err(e) => {
                warn!("Invalid JWT token: {}", e);
                false
            }
        }
    }

    /// 토큰 subject를 사용자 ID로 파싱.
    ///
    /// 서명이 올바른 토큰에 대해서만 의미가 있으므로 호출 전에
    /// [`validate`](Self::validate)를 거쳐야 합니다.
    pub fn subject_of(&self, token: &str) -> Result<i64, JwtError> {
        let data = decode::<BaseClaims>(token, &self.decoding_key, &Self::validation())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid,
            })?;

        data.claims.sub.parse().map_err(|_| JwtError::Invalid)
    }

    // 만료는 정확히 exp 시점에 판정한다 (기본 leeway 60초 제거).
    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        validation
    }
}
