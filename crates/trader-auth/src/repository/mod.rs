//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 서비스/핸들러에서 분리하여 관리합니다.
//! 저장소는 capability trait([`UserStore`])로 추상화되어 오케스트레이터에
//! 주입됩니다.

pub mod users;

pub use users::{NewUser, PgUserStore, ProviderType, Role, User, UserStore};
