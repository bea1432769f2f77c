use thiserror::Error;
use vsbt_core::Address;

/// Contract-level failure. `Display` is the revert reason string surfaced
/// to callers, so the wording of each variant is part of the interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("Ownable: caller is not the owner")]
    NotOwner,
    #[error("The contract is paused!")]
    Paused,
    #[error("VSBT already exists")]
    AlreadyExists,
    #[error("Insufficient funds!")]
    InsufficientFunds,
    #[error("Nothing to claim")]
    NothingToClaim,
    #[error("Nothing to withdraw")]
    NothingToWithdraw,
    #[error("Nonexistent token")]
    NonexistentToken,
    #[error("Pool has no liquidity")]
    NoLiquidity,
    #[error("EXPIRED")]
    Expired,
    #[error("ERC20: transfer amount exceeds balance")]
    InsufficientBalance,
    #[error("ERC20: insufficient allowance")]
    InsufficientAllowance,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transaction reverted: {0}")]
    Reverted(#[from] ContractError),
    #[error("no contract deployed at {0}")]
    UnknownContract(Address),
    #[error("contract {address} ({kind}) does not implement the {interface} interface")]
    WrongInterface {
        address: Address,
        kind: &'static str,
        interface: &'static str,
    },
    #[error("insufficient native balance: {account} has {available} wei, needs {required} wei")]
    InsufficientNativeBalance {
        account: Address,
        available: u128,
        required: u128,
    },
    #[error("chain state lock poisoned")]
    Lock,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ChainError {
    /// Revert reason when the failure came from contract logic.
    pub fn revert_reason(&self) -> Option<String> {
        match self {
            ChainError::Reverted(e) => Some(e.to_string()),
            _ => None,
        }
    }
}
