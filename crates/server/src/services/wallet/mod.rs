pub mod referral_code;
pub mod wallet_service;
