pub mod code;
pub mod entry;
pub mod mobile;

pub use code::{OneTimeCode, CODE_LENGTH};
pub use entry::{CodeEntry, Direction};
pub use mobile::{hash_mobile_number, MobileNumber};
