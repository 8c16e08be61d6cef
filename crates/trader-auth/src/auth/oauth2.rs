//! OAuth2 토큰 검증.
//!
//! provider가 발급한 토큰을 provider의 introspection 엔드포인트로 보내
//! 검증을 위임하고, 응답을 provider 중립적인 [`OAuth2UserInfo`]로
//! 정규화합니다. ID 토큰 서명을 로컬에서 검증하지 않습니다.
//!
//! audience(클라이언트 ID) 불일치는 경고 로그만 남기고 거부하지 않습니다.
//! 거부가 필요하면 [`OAuth2Verifier::verify_google`]에서 불일치 시
//! 에러를 반환하도록 바꾸면 됩니다.

use serde::{Deserialize, Deserializer};
use tracing::{error, warn};

use crate::config::OAuth2Settings;
use crate::error::AuthError;
use crate::repository::ProviderType;

/// Google tokeninfo 엔드포인트.
const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// provider 검증 호출의 연결 타임아웃.
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// 정규화된 OAuth2 사용자 정보.
///
/// 어떤 provider를 거치든 동일한 형태로 반환됩니다.
#[derive(Debug, Clone)]
pub struct OAuth2UserInfo {
    /// provider가 발급한 사용자 고유 ID
    pub provider_id: String,
    /// 사용자 이메일
    pub email: String,
    /// 사용자 이름
    pub name: String,
    /// 프로필 이미지 URL
    pub picture: Option<String>,
    /// 이메일 인증 여부
    pub email_verified: bool,
}

/// Google tokeninfo API 응답.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    /// Google 사용자 고유 ID
    sub: String,
    /// 사용자 이메일
    email: String,
    /// 사용자 이름
    name: String,
    /// 프로필 이미지 URL
    #[serde(default)]
    picture: Option<String>,
    /// 토큰이 발급된 클라이언트 ID (audience)
    aud: String,
    /// 이메일 인증 여부
    #[serde(default, deserialize_with = "bool_from_tokeninfo")]
    email_verified: bool,
}

// tokeninfo는 boolean 필드를 "true"/"false" 문자열로 반환하기도 한다
fn bool_from_tokeninfo<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::Str(s) => s == "true",
    })
}

/// OAuth2 토큰 검증기.
///
/// 검증 한 건당 provider로의 아웃바운드 HTTP 호출 한 번을 수행합니다.
/// 재시도와 응답 캐싱은 하지 않습니다.
pub struct OAuth2Verifier {
    http: reqwest::Client,
    google_client_id: String,
    google_tokeninfo_url: String,
}

impl OAuth2Verifier {
    /// 설정에서 검증기 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 초기화에 실패하면 에러를 반환합니다.
    pub fn new(settings: &OAuth2Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            google_client_id: settings.google_client_id.clone(),
            google_tokeninfo_url: GOOGLE_TOKENINFO_URL.to_string(),
        })
    }

    /// provider 토큰 검증.
    ///
    /// provider 종류에 따라 분기하며, 미구현 provider는 즉시 실패합니다.
    pub async fn verify(
        &self,
        token: &str,
        provider_type: ProviderType,
    ) -> Result<OAuth2UserInfo, AuthError> {
        match provider_type {
            ProviderType::Google => self.verify_google(token).await,
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Google 토큰 검증.
    ///
    /// tokeninfo 엔드포인트에 GET 요청을 보내고 응답을 정규화합니다.
    /// 전송 실패와 비정상 응답은 모두 검증 실패로 매핑되며,
    /// reqwest 에러가 밖으로 새어나가지 않습니다.
    async fn verify_google(&self, token: &str) -> Result<OAuth2UserInfo, AuthError> {
        let response = self
            .http
            .get(&self.google_tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| {
                error!("Google 토큰 검증 요청 실패: {}", e);
                AuthError::UpstreamVerification("Google 토큰이 유효하지 않습니다.".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::UpstreamVerification(format!(
                "Google 토큰 검증에 실패했습니다. Status: {}",
                status.as_u16()
            )));
        }

        let token_info: GoogleTokenInfo = response.json().await.map_err(|e| {
            error!("Google tokeninfo 응답 파싱 실패: {}", e);
            AuthError::UpstreamVerification("Google 토큰이 유효하지 않습니다.".to_string())
        })?;

        if token_info.aud != self.google_client_id {
            warn!(
                expected = %self.google_client_id,
                actual = %token_info.aud,
                "클라이언트 ID 불일치"
            );
        }

        Ok(OAuth2UserInfo {
            provider_id: token_info.sub,
            email: token_info.email,
            name: token_info.name,
            picture: token_info.picture,
            email_verified: token_info.email_verified,
        })
    }
}
