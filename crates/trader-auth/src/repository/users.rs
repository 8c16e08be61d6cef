//! User Repository
//!
//! 사용자 레코드의 조회/생성/수정을 담당합니다. 모든 변경은 명시적
//! read-then-write이며 암묵적 변경 추적은 없습니다.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

// ================================================================================================
// Types
// ================================================================================================

/// 계정 provider 종류.
///
/// 일반 가입은 LOCAL, 소셜 로그인은 provider별 값을 가집니다.
/// 사용자당 정확히 하나입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "provider_type", rename_all = "UPPERCASE")]
pub enum ProviderType {
    /// 이메일/비밀번호 가입
    Local,
    /// Google OAuth2
    Google,
    /// Apple Sign In (미지원)
    Apple,
}

impl ProviderType {
    /// 문자열로 변환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Google => "GOOGLE",
            Self::Apple => "APPLE",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    /// 일반 사용자
    User,
    /// 관리자
    Admin,
}

impl Role {
    /// 문자열로 변환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 사용자 레코드.
///
/// users 테이블의 데이터베이스 표현입니다. 비밀번호 해시와 Refresh Token은
/// 외부 응답에 직렬화되지 않습니다.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    /// 일반 가입 사용자만 보유, OAuth2 사용자는 None
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub provider_type: ProviderType,
    /// OAuth2 provider가 발급한 사용자 ID, LOCAL 사용자는 None
    pub provider_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
    /// 현재 유효한 Refresh Token. 새 로그인 시 덮어쓰고 로그아웃 시 비운다.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 새 사용자 입력.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub provider_type: ProviderType,
    pub provider_id: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl NewUser {
    /// 일반 가입 사용자 입력 생성.
    pub fn local(email: impl Into<String>, password_hash: String, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: Some(password_hash),
            name: name.into(),
            profile_image_url: None,
            provider_type: ProviderType::Local,
            provider_id: None,
            role: Role::User,
            is_active: true,
        }
    }

    /// OAuth2 사용자 입력 생성. 비밀번호 해시를 갖지 않는다.
    pub fn oauth2(
        email: impl Into<String>,
        name: impl Into<String>,
        profile_image_url: Option<String>,
        provider_type: ProviderType,
        provider_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: None,
            name: name.into(),
            profile_image_url,
            provider_type,
            provider_id: Some(provider_id.into()),
            role: Role::User,
            is_active: true,
        }
    }
}

// ================================================================================================
// Store
// ================================================================================================

/// 사용자 저장소 capability.
///
/// 오케스트레이터가 필요로 하는 조회/저장 연산만 노출합니다.
/// 동일 행에 대한 동시 쓰기 직렬화는 저장소 구현의 책임입니다
/// (last-write-wins 허용).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<User>>;

    async fn find_by_provider(
        &self,
        provider_type: ProviderType,
        provider_id: &str,
    ) -> Result<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    async fn insert(&self, new_user: NewUser) -> Result<User>;

    /// 이름/프로필 이미지 수정. 수정된 레코드를 반환한다.
    async fn update_profile(
        &self,
        id: i64,
        name: &str,
        profile_image_url: Option<&str>,
    ) -> Result<User>;

    /// Refresh Token 설정 또는 해제(None).
    async fn set_refresh_token(&self, id: i64, refresh_token: Option<&str>) -> Result<()>;
}

/// PostgreSQL 기반 사용자 저장소.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, User>("SELECT * FROM users WHERE refresh_token = $1")
            .bind(refresh_token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_by_provider(
        &self,
        provider_type: ProviderType,
        provider_id: &str,
    ) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE provider_type = $1 AND provider_id = $2",
        )
        .bind(provider_type)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (email, password_hash, name, profile_image_url,
                 provider_type, provider_id, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(&new_user.profile_image_url)
        .bind(new_user.provider_type)
        .bind(&new_user.provider_id)
        .bind(new_user.role)
        .bind(new_user.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_profile(
        &self,
        id: i64,
        name: &str,
        profile_image_url: Option<&str>,
    ) -> Result<User> {
        let record = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, profile_image_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(profile_image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn set_refresh_token(&self, id: i64, refresh_token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(refresh_token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
