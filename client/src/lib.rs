//! Client side of the faucet: node REST client, local wallet, typed
//! contract bridge and event subscriptions.

pub mod bridge;
pub mod config;
pub mod error;
pub mod rest_client;
pub mod subscription;
pub mod units;
pub mod wallet;

pub use bridge::{AccountSnapshot, FaucetBridge};
pub use config::BridgeConfig;
pub use error::{ClientError, WalletError};
pub use rest_client::NodeApiHttpClient;
pub use subscription::{Subscription, SubscriptionMessage, SubscriptionSlot};
pub use wallet::Wallet;
