// File: jeton-common/src/traits/mod.rs
pub mod repository_traits;
pub mod wallet_traits;
pub mod referral_traits;
pub mod notifier_traits;
