//! 인증 구성 요소.
//!
//! # 구성 요소
//!
//! - [`jwt`]: Access/Refresh Token 발급 및 검증 ([`TokenService`])
//! - [`password`]: Argon2 비밀번호 해싱/검증
//! - [`oauth2`]: OAuth2 provider 토큰 검증 ([`OAuth2Verifier`])

pub mod jwt;
pub mod oauth2;
pub mod password;

pub use jwt::{Claims, JwtError, RefreshClaims, TokenPair, TokenService};
pub use oauth2::{OAuth2UserInfo, OAuth2Verifier};
pub use password::{hash_password, verify_password, PasswordError};
