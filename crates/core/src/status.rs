//! Status codes stored in the database
//!
//! Every enum here has a stable snake_case string code used both in SQLite
//! rows and in serialized output.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// User activation status.
///
/// `Unverified` is the initial state at registration. `Active` is reached
/// only through a successful KYC submission and is terminal: there is no
/// re-verification flow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Unverified,
    Active,
}

/// Kind of a balance-affecting (or attempted) event
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    DepositFiat,
    DepositWeb3,
    InternalTransfer,
    WithdrawBank,
    WithdrawWeb3,
}

/// Lifecycle status of a ledger transaction.
///
/// A row is created in one of these states and may be finalized exactly once
/// (`Pending` -> `Completed` or `Failed`). Rows created `Completed` or
/// `Failed` are never touched again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

/// Whitelist entry status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WhitelistStatus {
    Normal,
    Frozen,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tx_kind_codes() {
        assert_eq!(TxKind::DepositFiat.to_string(), "deposit_fiat");
        assert_eq!(TxKind::WithdrawWeb3.to_string(), "withdraw_web3");
        assert_eq!(
            TxKind::from_str("internal_transfer").unwrap(),
            TxKind::InternalTransfer
        );
    }

    #[test]
    fn test_user_status_roundtrip() {
        for status in [UserStatus::Unverified, UserStatus::Active] {
            let code = status.to_string();
            assert_eq!(UserStatus::from_str(&code).unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(TxStatus::from_str("settled").is_err());
        assert!(WhitelistStatus::from_str("blocked").is_err());
    }
}
