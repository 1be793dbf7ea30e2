// Common test utilities

pub mod gateway;

pub use gateway::*;

use otp_login::LoginConfig;

pub const VALID_MOBILE: &str = "9876543210";

/// Default config; the mock gateway decides latency, not the config
pub fn test_config() -> LoginConfig {
    LoginConfig::default()
}
