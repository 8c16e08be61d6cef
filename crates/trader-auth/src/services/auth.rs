//! 인증 오케스트레이터.
//!
//! 회원가입, 로그인, 토큰 갱신, 로그아웃, 현재 사용자 조회, OAuth2 로그인
//! upsert를 처리합니다. 저장소는 [`UserStore`]로 주입받고 토큰은
//! [`TokenService`]로 발급합니다. 각 연산은 독립적인 요청 핸들러이며
//! 호출자 관점에서 원자적입니다(전부 성공하거나 에러 하나를 보고).

use std::sync::Arc;

use tracing::info;

use crate::auth::jwt::{TokenPair, TokenService};
use crate::auth::oauth2::OAuth2UserInfo;
use crate::auth::password::{hash_password, verify_password};
use crate::error::AuthError;
use crate::repository::{NewUser, ProviderType, User, UserStore};

/// 인증 서비스.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// 일반 회원가입.
    ///
    /// 이메일 중복 시 실패하고, 비밀번호는 단방향 해시로만 저장됩니다.
    pub async fn register_local(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        if self.store.exists_by_email(email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash =
            hash_password(password).map_err(|e| AuthError::Internal(anyhow::Error::new(e)))?;

        let user = self
            .store
            .insert(NewUser::local(email, password_hash, name))
            .await?;

        info!(user_id = user.id, "신규 사용자 가입");
        Ok(user)
    }

    /// 일반 로그인.
    ///
    /// 성공 시 토큰 쌍을 발급하고 새 Refresh Token을 사용자 레코드에
    /// 저장합니다(기존 토큰은 덮어써서 무효화).
    pub async fn login_local(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(TokenPair, User), AuthError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("사용자를 찾을 수 없습니다.".to_string()))?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            AuthError::InvalidCredentials("비밀번호가 일치하지 않습니다.".to_string())
        })?;

        verify_password(password, hash).map_err(|_| {
            AuthError::InvalidCredentials("비밀번호가 일치하지 않습니다.".to_string())
        })?;

        let pair = self.issue_session(&user).await?;
        Ok((pair, user))
    }

    /// Access Token 갱신.
    ///
    /// 제시된 Refresh Token이 어떤 사용자 레코드에도 저장되어 있지 않으면
    /// 실패합니다. 이전 로그인에서 발급된 뒤 덮어써진 토큰은 더 이상
    /// 일치하지 않으므로 이 조회가 서버 측 폐기 검사 역할을 합니다.
    /// Refresh Token 자체는 회전하지 않고 그대로 반환합니다.
    pub async fn refresh(&self, auth_header: Option<&str>) -> Result<TokenPair, AuthError> {
        let refresh_token = extract_bearer(auth_header)?;

        if !self.tokens.validate(refresh_token) {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .store
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                AuthError::InvalidCredentials("Refresh Token을 찾을 수 없습니다.".to_string())
            })?;

        let access_token = self
            .tokens
            .issue_access_token(user.id, &user.email, user.role)?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Access Token으로 현재 사용자 조회.
    pub async fn current_user(&self, auth_header: Option<&str>) -> Result<User, AuthError> {
        let token = extract_bearer(auth_header)?;

        if !self.tokens.validate(token) {
            return Err(AuthError::InvalidToken);
        }

        let user_id = self.tokens.subject_of(token)?;
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("사용자를 찾을 수 없습니다.".to_string()))
    }

    /// 로그아웃.
    ///
    /// 저장된 Refresh Token만 비웁니다. 이미 발급된 Access Token은
    /// 만료 전까지 계속 유효합니다.
    pub async fn logout(&self, auth_header: Option<&str>) -> Result<(), AuthError> {
        let user = self.current_user(auth_header).await?;

        self.store.set_refresh_token(user.id, None).await?;

        info!(user_id = user.id, "로그아웃");
        Ok(())
    }

    /// OAuth2 로그인 upsert.
    ///
    /// (provider, provider_id)로 기존 사용자를 찾아 프로필이 달라진 경우에만
    /// 갱신하고, 없으면 비밀번호 없는 신규 사용자를 생성합니다.
    /// 이메일이 같아도 provider 신원이 다르면 별개 계정으로 취급합니다.
    pub async fn oauth2_login(
        &self,
        provider_type: ProviderType,
        identity: OAuth2UserInfo,
    ) -> Result<(TokenPair, User), AuthError> {
        let existing = self
            .store
            .find_by_provider(provider_type, &identity.provider_id)
            .await?;

        let user = match existing {
            Some(user) => self.refresh_oauth2_profile(user, &identity).await?,
            None => {
                let user = self
                    .store
                    .insert(NewUser::oauth2(
                        &identity.email,
                        &identity.name,
                        identity.picture.clone(),
                        provider_type,
                        &identity.provider_id,
                    ))
                    .await?;
                info!(user_id = user.id, provider = %provider_type, "신규 OAuth2 사용자 생성");
                user
            }
        };

        let pair = self.issue_session(&user).await?;
        Ok((pair, user))
    }

    /// OAuth2 재로그인 시 프로필 갱신.
    ///
    /// 새 값이 비어 있지 않고 기존 값과 다를 때만 쓴다.
    async fn refresh_oauth2_profile(
        &self,
        user: User,
        identity: &OAuth2UserInfo,
    ) -> Result<User, AuthError> {
        let name_changed = !identity.name.is_empty() && identity.name != user.name;
        let picture_changed = identity
            .picture
            .as_ref()
            .is_some_and(|p| user.profile_image_url.as_ref() != Some(p));

        if !name_changed && !picture_changed {
            return Ok(user);
        }

        let name = if name_changed {
            identity.name.as_str()
        } else {
            user.name.as_str()
        };
        let picture = if picture_changed {
            identity.picture.as_deref()
        } else {
            user.profile_image_url.as_deref()
        };

        let updated = self.store.update_profile(user.id, name, picture).await?;
        Ok(updated)
    }

    /// 토큰 쌍 발급 및 Refresh Token 저장.
    ///
    /// 사용자당 유효한 Refresh Token은 마지막으로 저장된 하나뿐이다.
    async fn issue_session(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = self
            .tokens
            .issue_access_token(user.id, &user.email, user.role)?;
        let refresh_token = self.tokens.issue_refresh_token(user.id)?;

        self.store
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// Authorization 헤더에서 Bearer 토큰 추출.
fn extract_bearer(auth_header: Option<&str>) -> Result<&str, AuthError> {
    auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    use crate::config::JwtSettings;
    use crate::repository::Role;

    const TEST_SECRET: &str = "test-secret-key-for-auth-service-tests-32chars";

    /// 인메모리 사용자 저장소 (테스트 전용).
    #[derive(Default)]
    struct MemoryUserStore {
        users: Mutex<Vec<User>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.refresh_token.as_deref() == Some(refresh_token))
                .cloned())
        }

        async fn find_by_provider(
            &self,
            provider_type: ProviderType,
            provider_id: &str,
        ) -> Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| {
                    u.provider_type == provider_type
                        && u.provider_id.as_deref() == Some(provider_id)
                })
                .cloned())
        }

        async fn exists_by_email(&self, email: &str) -> Result<bool> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.email == email))
        }

        async fn insert(&self, new_user: NewUser) -> Result<User> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let now = Utc::now();
            let user = User {
                id,
                email: new_user.email,
                password_hash: new_user.password_hash,
                name: new_user.name,
                profile_image_url: new_user.profile_image_url,
                provider_type: new_user.provider_type,
                provider_id: new_user.provider_id,
                role: new_user.role,
                is_active: new_user.is_active,
                refresh_token: None,
                created_at: now,
                updated_at: now,
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn update_profile(
            &self,
            id: i64,
            name: &str,
            profile_image_url: Option<&str>,
        ) -> Result<User> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .expect("update_profile: unknown id");
            user.name = name.to_string();
            user.profile_image_url = profile_image_url.map(str::to_string);
            user.updated_at = Utc::now();
            Ok(user.clone())
        }

        async fn set_refresh_token(&self, id: i64, refresh_token: Option<&str>) -> Result<()> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .expect("set_refresh_token: unknown id");
            user.refresh_token = refresh_token.map(str::to_string);
            user.updated_at = Utc::now();
            Ok(())
        }
    }

    fn test_settings() -> JwtSettings {
        JwtSettings {
            secret: TEST_SECRET.to_string(),
            access_token_ttl_secs: 1800,
            refresh_token_ttl_secs: 1_209_600,
        }
    }

    fn test_service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::default()),
            TokenService::new(&test_settings()),
        )
    }

    fn google_identity(provider_id: &str, email: &str, name: &str) -> OAuth2UserInfo {
        OAuth2UserInfo {
            provider_id: provider_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            picture: None,
            email_verified: true,
        }
    }

    #[tokio::test]
    async fn test_register_then_duplicate_fails() {
        let service = test_service();

        let user = service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.provider_type, ProviderType::Local);
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
        // 해시만 저장되고 평문은 남지 않는다
        assert!(user.password_hash.as_deref().unwrap().starts_with("$argon2id$"));

        let result = service.register_local("a@x.com", "password2", "Ann2").await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_login_and_refresh_roundtrip() {
        let service = test_service();
        let registered = service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();

        let (pair, user) = service.login_local("a@x.com", "password1").await.unwrap();
        assert_eq!(user.id, registered.id);
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        // 발급 직후의 Refresh Token은 즉시 갱신에 사용할 수 있어야 함
        let header = format!("Bearer {}", pair.refresh_token);
        let refreshed = service.refresh(Some(&header)).await.unwrap();

        // Refresh Token은 회전하지 않음
        assert_eq!(refreshed.refresh_token, pair.refresh_token);

        // 새 Access Token의 subject는 동일 사용자
        let tokens = TokenService::new(&test_settings());
        assert_eq!(
            tokens.subject_of(&refreshed.access_token).unwrap(),
            registered.id
        );
    }

    #[tokio::test]
    async fn test_superseded_refresh_token_is_rejected() {
        let service = test_service();
        service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();

        let (first, _) = service.login_local("a@x.com", "password1").await.unwrap();
        let (second, _) = service.login_local("a@x.com", "password1").await.unwrap();

        // 두 번째 로그인이 첫 Refresh Token을 덮어써서 무효화함
        let old_header = format!("Bearer {}", first.refresh_token);
        let result = service.refresh(Some(&old_header)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));

        let new_header = format!("Bearer {}", second.refresh_token);
        assert!(service.refresh(Some(&new_header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = test_service();
        service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();

        let wrong = service.login_local("a@x.com", "wrong").await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials(_))));

        let unknown = service.login_local("nobody@x.com", "password1").await;
        assert!(matches!(unknown, Err(AuthError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_current_user_header_handling() {
        let service = test_service();
        service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();
        let (pair, _) = service.login_local("a@x.com", "password1").await.unwrap();

        // 유효한 토큰이라도 Bearer 접두사가 없으면 거부
        let result = service.current_user(Some(&pair.access_token)).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));

        let result = service
            .current_user(Some(&format!("Token {}", pair.access_token)))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));

        let result = service.current_user(None).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));

        // 정상 헤더
        let user = service
            .current_user(Some(&format!("Bearer {}", pair.access_token)))
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_current_user_rejects_garbage_token() {
        let service = test_service();
        let result = service.current_user(Some("Bearer not.a.jwt")).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_logout_clears_refresh_token_only() {
        let service = test_service();
        service
            .register_local("a@x.com", "password1", "Ann")
            .await
            .unwrap();
        let (pair, _) = service.login_local("a@x.com", "password1").await.unwrap();

        let access_header = format!("Bearer {}", pair.access_token);
        service.logout(Some(&access_header)).await.unwrap();

        // Refresh Token 기반 갱신은 더 이상 불가
        let refresh_header = format!("Bearer {}", pair.refresh_token);
        let result = service.refresh(Some(&refresh_header)).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));

        // 이미 발급된 Access Token은 만료 전까지 계속 동작 (문서화된 한계)
        assert!(service.current_user(Some(&access_header)).await.is_ok());
    }

    #[tokio::test]
    async fn test_oauth2_login_creates_then_updates_profile() {
        let service = test_service();

        let (_, created) = service
            .oauth2_login(
                ProviderType::Google,
                google_identity("g123", "g@x.com", "Bob"),
            )
            .await
            .unwrap();
        assert_eq!(created.provider_type, ProviderType::Google);
        assert_eq!(created.provider_id.as_deref(), Some("g123"));
        assert!(created.password_hash.is_none());
        assert_eq!(created.name, "Bob");

        // 같은 provider 신원으로 재로그인, 이름만 변경됨
        let (_, updated) = service
            .oauth2_login(
                ProviderType::Google,
                google_identity("g123", "g@x.com", "Bobby"),
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Bobby");
        assert_eq!(updated.email, "g@x.com");
        assert_eq!(updated.provider_id.as_deref(), Some("g123"));
    }

    #[tokio::test]
    async fn test_oauth2_login_never_merges_accounts() {
        let service = test_service();

        let (_, first) = service
            .oauth2_login(
                ProviderType::Google,
                google_identity("g123", "g@x.com", "Bob"),
            )
            .await
            .unwrap();

        // 같은 이메일이라도 provider_id가 다르면 별개 계정
        let (_, second) = service
            .oauth2_login(
                ProviderType::Google,
                google_identity("g456", "g@x.com", "Bob"),
            )
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_oauth2_login_persists_refresh_token() {
        let service = test_service();

        let (pair, user) = service
            .oauth2_login(
                ProviderType::Google,
                google_identity("g123", "g@x.com", "Bob"),
            )
            .await
            .unwrap();

        let refreshed = service
            .refresh(Some(&format!("Bearer {}", pair.refresh_token)))
            .await
            .unwrap();

        let tokens = TokenService::new(&test_settings());
        assert_eq!(tokens.subject_of(&refreshed.access_token).unwrap(), user.id);
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(extract_bearer(Some("bearer abc")).is_err());
        assert!(extract_bearer(Some("Bearer ")).is_err());
        assert!(extract_bearer(Some("abc")).is_err());
        assert!(extract_bearer(None).is_err());
    }
}
