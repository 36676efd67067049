use std::path::PathBuf;

/// A line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Optional key file overriding the configured one.
    Connect(Option<PathBuf>),
    Claim,
    Refresh,
    Disconnect,
    Help,
    Quit,
    /// Answer to a pending confirmation.
    Answer(bool),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str, awaiting_confirmation: bool) -> Option<Self> {
        let line = line.trim();
        if awaiting_confirmation {
            return Some(Command::Answer(matches!(
                line.to_ascii_lowercase().as_str(),
                "y" | "yes"
            )));
        }
        let mut words = line.split_whitespace();
        let command = match words.next()? {
            "connect" | "c" => Command::Connect(words.next().map(PathBuf::from)),
            "claim" | "request" => Command::Claim,
            "refresh" | "r" => Command::Refresh,
            "disconnect" | "d" => Command::Disconnect,
            "help" | "h" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

pub const HELP: &str = "\
Commands:
  connect [key-file]  load the wallet and start watching the account
  claim               request tokens from the faucet
  refresh             re-read balance and eligibility
  disconnect          forget the account and stop watching it
  quit                leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("", false), None);
        assert_eq!(Command::parse("  claim ", false), Some(Command::Claim));
        assert_eq!(
            Command::parse("connect wallet.key", false),
            Some(Command::Connect(Some(PathBuf::from("wallet.key"))))
        );
        assert_eq!(Command::parse("connect", false), Some(Command::Connect(None)));
        assert_eq!(
            Command::parse("dance", false),
            Some(Command::Unknown("dance".into()))
        );
    }

    #[test]
    fn pending_confirmation_takes_any_line() {
        assert_eq!(Command::parse("Y", true), Some(Command::Answer(true)));
        assert_eq!(Command::parse("claim", true), Some(Command::Answer(false)));
        assert_eq!(Command::parse("", true), Some(Command::Answer(false)));
    }
}
