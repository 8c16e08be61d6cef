//! 도메인 서비스.
//!
//! 요청 핸들러에서 분리된 인증 비즈니스 로직을 담습니다.

pub mod auth;

pub use auth::AuthService;
