//! Mobile number + one-time code login for the KYC demo
//!
//! Architecture:
//!   View → LoginFlow (async round trips, events) → AuthSession (state, two-phase requests)
//!
//! Responsibilities:
//! - Mobile number validation (10 digits, leading 6-9)
//! - Simulated code delivery and verification with network latency
//! - Segmented six-slot code entry with focus handling
//! - Resend cooldown as a cancellable one-second countdown
//!
//! Nothing leaves the process: codes are generated in memory and compared in
//! the session. The surrounding application listens for
//! [`LoginEvent::Verified`] to move the user on.

pub mod config;
pub mod countdown;
pub mod error;
pub mod events;
pub mod flow;
pub mod gateway;
pub mod models;
pub mod session;

pub use config::LoginConfig;
pub use countdown::Countdown;
pub use error::AuthError;
pub use events::{LoginEvent, LANDING_ROUTE};
pub use flow::{LoginFlow, Submission};
pub use gateway::{BaseOtpGateway, DeliveredCode, LatencyProfile, SimulatedGateway};
pub use models::{CodeEntry, Direction, MobileNumber, OneTimeCode, CODE_LENGTH};
pub use session::{AuthSession, Completion, SessionSnapshot, Stage};
