pub mod advance;
pub mod kyc;
pub mod otp;
pub mod session;
pub mod subscription;
pub mod token;
pub mod user;
pub mod wallet;
