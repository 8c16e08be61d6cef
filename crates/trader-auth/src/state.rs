//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 Axum의 State extractor를 통해
//! 핸들러에 주입됩니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::auth::jwt::TokenService;
use crate::auth::oauth2::OAuth2Verifier;
use crate::config::{JwtSettings, OAuth2Settings};
use crate::repository::PgUserStore;
use crate::services::AuthService;

/// 애플리케이션 공유 상태.
pub struct AppState {
    /// 인증 오케스트레이터
    pub auth: AuthService,

    /// OAuth2 토큰 검증기
    pub verifier: OAuth2Verifier,

    /// 데이터베이스 연결 풀 (헬스 체크용)
    pub db_pool: PgPool,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 설정과 연결 풀에서 상태 구성.
    pub fn new(
        pool: PgPool,
        jwt_settings: &JwtSettings,
        oauth2_settings: &OAuth2Settings,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(PgUserStore::new(pool.clone()));
        let auth = AuthService::new(store, TokenService::new(jwt_settings));
        let verifier = OAuth2Verifier::new(oauth2_settings)?;

        Ok(Self {
            auth,
            verifier,
            db_pool: pool,
            started_at: Utc::now(),
        })
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}
