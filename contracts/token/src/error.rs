use contracts::Revert;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Only minter can mint")]
    NotMinter,

    #[error("Only owner can set minter")]
    NotOwner,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Amount overflows token supply")]
    Overflow,
}

impl TokenError {
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::NotMinter => "NOT_MINTER",
            TokenError::NotOwner => "NOT_OWNER",
            TokenError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TokenError::Overflow => "OVERFLOW",
        }
    }
}

impl From<TokenError> for Revert {
    fn from(err: TokenError) -> Self {
        Revert::new(err.code(), err.to_string())
    }
}
