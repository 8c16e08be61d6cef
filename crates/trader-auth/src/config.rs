//! 서버 및 인증 설정.
//!
//! 모든 설정은 환경 변수에서 한 번 로드되어 불변 구조체로 각 컴포넌트에
//! 주입됩니다. 전역 가변 상태는 사용하지 않습니다.

use anyhow::bail;
use tracing::warn;

/// 서버 설정 구조체.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드.
    ///
    /// # 환경변수
    ///
    /// - `API_HOST`: 바인딩 호스트 (기본값: 127.0.0.1)
    /// - `API_PORT`: 바인딩 포트 (기본값: 3000)
    pub fn from_env() -> Self {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self { host, port }
    }

    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// JWT 토큰 설정.
///
/// 서명 비밀 키와 토큰별 유효기간을 담습니다.
/// `TokenService` 생성 시 주입됩니다.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// HMAC 서명 비밀 키
    pub secret: String,
    /// Access Token 유효기간 (초)
    pub access_token_ttl_secs: i64,
    /// Refresh Token 유효기간 (초). 항상 Access Token보다 길어야 한다.
    pub refresh_token_ttl_secs: i64,
}

impl JwtSettings {
    /// 환경 변수에서 설정 로드.
    ///
    /// # 환경변수
    ///
    /// - `JWT_SECRET`: 서명 비밀 키
    /// - `JWT_ACCESS_TOKEN_TTL_SECS`: Access Token 유효기간 (기본값: 1800 = 30분)
    /// - `JWT_REFRESH_TOKEN_TTL_SECS`: Refresh Token 유효기간 (기본값: 1209600 = 14일)
    ///
    /// # Errors
    /// Refresh Token 유효기간이 Access Token 이하로 설정된 경우 실패합니다.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (INSECURE for development only)");
            "dev-secret-key-change-in-production".to_string()
        });

        let settings = Self {
            secret,
            access_token_ttl_secs: env_i64("JWT_ACCESS_TOKEN_TTL_SECS", 1800),
            refresh_token_ttl_secs: env_i64("JWT_REFRESH_TOKEN_TTL_SECS", 1_209_600),
        };
        settings.validate()?;

        Ok(settings)
    }

    /// 유효기간 불변식 검사.
    ///
    /// Refresh Token은 Access Token 갱신에 쓰이므로 유효기간이 더 길어야 한다.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            bail!(
                "Refresh Token 유효기간({}s)은 Access Token 유효기간({}s)보다 길어야 합니다",
                self.refresh_token_ttl_secs,
                self.access_token_ttl_secs
            );
        }
        Ok(())
    }
}

/// OAuth2 provider 설정.
///
/// provider별로 기대하는 클라이언트 ID를 담습니다.
/// `OAuth2Verifier` 생성 시 주입됩니다.
#[derive(Debug, Clone)]
pub struct OAuth2Settings {
    /// Google OAuth2 클라이언트 ID (tokeninfo 응답의 aud와 대조)
    pub google_client_id: String,
}

impl OAuth2Settings {
    /// 환경 변수에서 설정 로드.
    ///
    /// # 환경변수
    ///
    /// - `OAUTH2_GOOGLE_CLIENT_ID`: Google Cloud Console에서 발급받은 클라이언트 ID
    pub fn from_env() -> Self {
        let google_client_id = std::env::var("OAUTH2_GOOGLE_CLIENT_ID").unwrap_or_else(|_| {
            warn!("OAUTH2_GOOGLE_CLIENT_ID not set, audience check will never match");
            "default-google-client-id".to_string()
        });

        Self { google_client_id }
    }
}

/// i64 환경 변수 파싱 (실패 시 기본값).
fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
