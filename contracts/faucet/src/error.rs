use contracts::Revert;

/// Reasons a faucet call aborts. The messages are what users see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaucetError {
    #[error("Faucet is paused")]
    Paused,

    #[error("Cooldown period not elapsed")]
    CooldownNotElapsed,

    #[error("Lifetime claim limit reached")]
    LifetimeCapExceeded,

    #[error("Only admin can call this function")]
    Unauthorized,

    #[error("Invalid faucet parameters: {0}")]
    InvalidParams(String),

    #[error("Could not encode mint call: {0}")]
    Encoding(String),
}

impl FaucetError {
    pub fn code(&self) -> &'static str {
        match self {
            FaucetError::Paused => "FAUCET_PAUSED",
            FaucetError::CooldownNotElapsed => "COOLDOWN_NOT_ELAPSED",
            FaucetError::LifetimeCapExceeded => "LIFETIME_CAP_EXCEEDED",
            FaucetError::Unauthorized => "UNAUTHORIZED",
            FaucetError::InvalidParams(_) => "INVALID_PARAMS",
            FaucetError::Encoding(_) => "ENCODING",
        }
    }
}

impl From<FaucetError> for Revert {
    fn from(err: FaucetError) -> Self {
        Revert::new(err.code(), err.to_string())
    }
}

/// Recovers the typed error from a revert received over the wire.
impl TryFrom<&Revert> for FaucetError {
    type Error = ();

    fn try_from(revert: &Revert) -> Result<Self, Self::Error> {
        let detail = || {
            revert
                .reason
                .split_once(": ")
                .map(|(_, d)| d.to_string())
                .unwrap_or_default()
        };
        match revert.code.as_str() {
            "FAUCET_PAUSED" => Ok(FaucetError::Paused),
            "COOLDOWN_NOT_ELAPSED" => Ok(FaucetError::CooldownNotElapsed),
            "LIFETIME_CAP_EXCEEDED" => Ok(FaucetError::LifetimeCapExceeded),
            "UNAUTHORIZED" => Ok(FaucetError::Unauthorized),
            "INVALID_PARAMS" => Ok(FaucetError::InvalidParams(detail())),
            "ENCODING" => Ok(FaucetError::Encoding(detail())),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_maps_back_to_typed_error() {
        for err in [
            FaucetError::Paused,
            FaucetError::CooldownNotElapsed,
            FaucetError::LifetimeCapExceeded,
            FaucetError::Unauthorized,
            FaucetError::InvalidParams("claim amount is zero".to_string()),
        ] {
            let revert = Revert::from(err.clone());
            assert_eq!(FaucetError::try_from(&revert), Ok(err));
        }
        assert!(FaucetError::try_from(&Revert::new("NOT_MINTER", "Only minter can mint")).is_err());
    }
}
