use client::{units::format_units, AccountSnapshot, ClientError, WalletError};
use contracts::{api::NodeInfo, Identity};

/// What the shell knows and shows about the connected account.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub account: Option<Identity>,
    pub balance: u128,
    pub can_claim: bool,
    pub remaining_allowance: u128,
    pub paused: bool,
    /// Seconds until the next claim.
    pub cooldown: u64,
    pub loading: bool,
    pub awaiting_confirmation: bool,
    pub error: Option<String>,
    pub success: Option<String>,
    pub network_ok: bool,
    pub current_network: String,
    pub config_error: Option<String>,
    expected_chain_id: u64,
    last_chain_id: Option<u64>,
    symbol: String,
    decimals: u8,
    claim_amount: u128,
}

impl Session {
    pub fn new(expected_chain_id: u64, config_error: Option<String>) -> Self {
        Self {
            account: None,
            balance: 0,
            can_claim: false,
            remaining_allowance: 0,
            paused: false,
            cooldown: 0,
            loading: false,
            awaiting_confirmation: false,
            error: None,
            success: None,
            network_ok: true,
            current_network: "Checking network".to_string(),
            config_error,
            expected_chain_id,
            last_chain_id: None,
            symbol: "JAN".to_string(),
            decimals: 18,
            claim_amount: faucet::CLAIM_AMOUNT,
        }
    }

    pub fn set_token(&mut self, symbol: String, decimals: u8) {
        self.symbol = symbol;
        self.decimals = decimals;
    }

    pub fn set_claim_amount(&mut self, amount: u128) {
        self.claim_amount = amount;
    }

    pub fn connected(&mut self, account: Identity) {
        self.account = Some(account);
        self.error = None;
        self.success = None;
    }

    /// Forgets the account and everything read for it.
    pub fn disconnected(&mut self) {
        *self = Self {
            network_ok: self.network_ok,
            current_network: std::mem::take(&mut self.current_network),
            last_chain_id: self.last_chain_id,
            symbol: std::mem::take(&mut self.symbol),
            decimals: self.decimals,
            claim_amount: self.claim_amount,
            ..Self::new(self.expected_chain_id, self.config_error.take())
        };
    }

    pub fn apply_snapshot(&mut self, snapshot: &AccountSnapshot) {
        if self.account.as_ref() != Some(&snapshot.account) {
            return;
        }
        self.balance = snapshot.balance;
        self.can_claim = snapshot.claimant.can_claim;
        self.remaining_allowance = snapshot.claimant.remaining_allowance;
        self.cooldown = snapshot.claimant.cooldown_remaining();
        self.paused = snapshot.paused;
    }

    /// A failed refresh. Keeps the last values on screen.
    pub fn refresh_failed(&mut self, err: &ClientError) {
        let detail = if err.is_timeout() {
            "node did not answer in time.".to_string()
        } else {
            let message: String = err.to_string().chars().take(60).collect();
            format!("{message}...")
        };
        self.error = Some(format!(
            "Blockchain Error: {detail} Check that the node is reachable."
        ));
    }

    /// Records the outcome of a network poll. Returns true when the node
    /// switched chains under a connected account, in which case the session
    /// has been reset.
    pub fn apply_network(&mut self, result: Result<&NodeInfo, &ClientError>) -> bool {
        let chain_id = match result {
            Ok(info) => {
                self.network_ok = true;
                self.current_network = format!("Chain ID: {}", info.chain_id);
                Some(info.chain_id)
            }
            Err(ClientError::Wallet(WalletError::NetworkMismatch { actual, .. })) => {
                self.network_ok = false;
                self.current_network = format!("Chain ID: {actual}");
                Some(*actual)
            }
            Err(_) => {
                self.network_ok = false;
                self.current_network = "Unreachable".to_string();
                None
            }
        };
        let Some(chain_id) = chain_id else {
            return false;
        };
        let changed = self.last_chain_id.is_some_and(|last| last != chain_id);
        self.last_chain_id = Some(chain_id);
        if changed && self.account.is_some() {
            self.disconnected();
            self.error = Some("Network changed, reconnect your wallet".to_string());
            return true;
        }
        false
    }

    /// One second passed.
    pub fn tick(&mut self) -> bool {
        if self.cooldown == 0 {
            return false;
        }
        self.cooldown -= 1;
        true
    }

    pub fn claim_enabled(&self) -> bool {
        self.account.is_some() && self.can_claim && !self.loading
    }

    pub fn claim_started(&mut self) {
        self.loading = true;
        self.awaiting_confirmation = false;
        self.error = None;
        self.success = None;
    }

    pub fn claim_finished(&mut self, result: Result<&str, &ClientError>) {
        self.loading = false;
        match result {
            Ok(_) => self.success = Some("Tokens successfully claimed!".to_string()),
            Err(err) => self.error = Some(error_text(err)),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Token Faucet\n");
        let mut badges = vec![if self.account.is_some() {
            "[Connected]".to_string()
        } else {
            "[Disconnected]".to_string()
        }];
        if self.network_ok {
            badges.push(format!("[{}]", self.current_network));
        } else {
            badges.push(format!("[Wrong Network: {}]", self.current_network));
        }
        if self.config_error.is_some() {
            badges.push("[Config Error]".to_string());
        }
        out.push_str(&badges.join(" "));
        out.push('\n');

        match &self.account {
            Some(account) => {
                let amount = |v: u128| format!("{} {}", format_units(v, self.decimals), self.symbol);
                out.push_str(&format!("Wallet Address:     {}\n", account.short()));
                out.push_str(&format!("Token Balance:      {}\n", amount(self.balance)));
                out.push_str(&format!(
                    "Lifetime Allowance: {}\n",
                    amount(self.remaining_allowance)
                ));
                out.push_str(&format!("Cooldown:           {}\n", format_time(self.cooldown)));
                if self.paused {
                    out.push_str("Faucet is paused\n");
                }
                let action = if self.loading {
                    "Submitting...".to_string()
                } else if self.awaiting_confirmation {
                    format!("Confirm claim of {}? [y/N]", amount(self.claim_amount))
                } else if self.claim_enabled() {
                    format!("> claim: Request {}", amount(self.claim_amount))
                } else {
                    format!("  (claim unavailable: Request {})", amount(self.claim_amount))
                };
                out.push_str(&action);
                out.push('\n');
            }
            None => {
                out.push_str("Connect your wallet to start claiming tokens from the faucet.\n");
                out.push_str("> connect\n");
            }
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {error}\n"));
        }
        if let Some(success) = &self.success {
            out.push_str(&format!("{success}\n"));
        }
        out
    }
}

/// Text shown for a failed transaction.
pub fn error_text(err: &ClientError) -> String {
    match err {
        ClientError::Reverted(revert) => revert.reason.clone(),
        ClientError::Wallet(WalletError::Rejected) => "Transaction rejected by user".to_string(),
        ClientError::Configuration(reason) => reason.clone(),
        _ => "Transaction failed".to_string(),
    }
}

pub fn format_time(seconds: u64) -> String {
    if seconds == 0 {
        return "Ready".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}
