//! Scripted gateway for flow tests.
//!
//! Codes are handed out in the order they were scripted, each after a fixed
//! delay. Calls are recorded so tests can assert that a trigger never
//! reached the gateway.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use otp_login::{BaseOtpGateway, MobileNumber, OneTimeCode};

pub const MOCK_DELAY: Duration = Duration::from_millis(500);

pub struct MockOtpGateway {
    codes: Mutex<VecDeque<OneTimeCode>>,
    delay: Duration,
    offline: bool,
    send_calls: Mutex<Vec<String>>,
    verify_calls: Mutex<Vec<String>>,
}

impl Default for MockOtpGateway {
    fn default() -> Self {
        Self {
            codes: Mutex::new(VecDeque::new()),
            delay: MOCK_DELAY,
            offline: false,
            send_calls: Mutex::new(Vec::new()),
            verify_calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockOtpGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a code to be issued by the next send
    pub fn with_code(self, digits: &str) -> Self {
        let code = OneTimeCode::from_digits(digits).expect("scripted code must be 6 digits");
        self.codes.lock().unwrap().push_back(code);
        self
    }

    /// Every call fails after the delay
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn send_calls(&self) -> Vec<String> {
        self.send_calls.lock().unwrap().clone()
    }

    pub fn verify_calls(&self) -> Vec<String> {
        self.verify_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseOtpGateway for MockOtpGateway {
    async fn send_otp(&self, mobile: &MobileNumber) -> Result<OneTimeCode> {
        self.send_calls.lock().unwrap().push(mobile.to_string());
        tokio::time::sleep(self.delay).await;

        if self.offline {
            bail!("gateway offline");
        }
        match self.codes.lock().unwrap().pop_front() {
            Some(code) => Ok(code),
            None => bail!("no scripted code left"),
        }
    }

    async fn verify_round_trip(&self, mobile: &MobileNumber) -> Result<()> {
        self.verify_calls.lock().unwrap().push(mobile.to_string());
        tokio::time::sleep(self.delay).await;

        if self.offline {
            bail!("gateway offline");
        }
        Ok(())
    }
}
