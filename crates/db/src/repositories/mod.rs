pub mod advance_repo;
pub mod kyc_repo;
pub mod otp_repo;
pub mod session_repo;
pub mod subscription_repo;
pub mod token_repo;
pub mod user_repo;
pub mod wallet_repo;

pub use advance_repo::AdvanceRepo;
pub use kyc_repo::KycRepo;
pub use otp_repo::OtpRepo;
pub use session_repo::SessionRepo;
pub use subscription_repo::SubscriptionRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;
pub use wallet_repo::WalletRepo;
