//! Single process node hosting the token ledger and the faucet.

pub mod app;
pub mod chain;
pub mod clock;
pub mod conf;
mod indexer;
pub mod logger;
pub mod metrics;
pub mod node;
pub mod store;

pub use app::{build_router, AppModuleCtx};
pub use chain::{ChainState, Program, TxFailure};
pub use clock::Clock;
pub use conf::Conf;
pub use node::Node;
