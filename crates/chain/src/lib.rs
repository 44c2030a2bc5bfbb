//! Cexbank Chain - External transfer gateway seam
//!
//! The hot-wallet RPC client itself is outside this system; what the engine
//! sees is the [`TransferGateway`] capability: send value to an address, get
//! back a transaction hash or a failure that is either definite or
//! indeterminate. The distinction matters — an indeterminate outcome means
//! the send may still land on-chain and must never be retried automatically.

pub mod gateway;
pub mod simulated;
pub mod units;

pub use gateway::{GatewayError, TransferGateway, TxHash};
pub use simulated::SimulatedGateway;
pub use units::to_base_units;
