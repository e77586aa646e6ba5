// Line-based operator commands read from the console.

use std::str::FromStr;

use anyhow::{anyhow, bail};

pub const HELP: &str = "commands: workers <0-4> | batch <code> | batch | state | help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Workers(i32),
    /// Empty code clears the batch.
    Batch(String),
    State,
    Help,
}

impl FromStr for OperatorCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let argument = words.next();
        if words.next().is_some() {
            bail!("too many arguments to `{command}`");
        }

        match (command, argument) {
            ("workers", Some(n)) => n
                .parse()
                .map(OperatorCommand::Workers)
                .map_err(|_| anyhow!("`{n}` is not a number")),
            ("workers", None) => bail!("usage: workers <0-4>"),
            ("batch", code) => Ok(OperatorCommand::Batch(code.unwrap_or_default().to_string())),
            ("state", None) => Ok(OperatorCommand::State),
            ("help", None) => Ok(OperatorCommand::Help),
            _ => bail!("unknown command `{line}`, {HELP}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("workers 3".parse::<OperatorCommand>().unwrap(), OperatorCommand::Workers(3));
        assert_eq!("  batch  B-17 ".parse::<OperatorCommand>().unwrap(), OperatorCommand::Batch("B-17".into()));
        assert_eq!("batch".parse::<OperatorCommand>().unwrap(), OperatorCommand::Batch(String::new()));
        assert_eq!("state".parse::<OperatorCommand>().unwrap(), OperatorCommand::State);
        assert_eq!("help".parse::<OperatorCommand>().unwrap(), OperatorCommand::Help);
    }

    #[test]
    fn range_is_checked_by_device_not_parser() {
        assert_eq!("workers -1".parse::<OperatorCommand>().unwrap(), OperatorCommand::Workers(-1));
        assert_eq!("workers 12".parse::<OperatorCommand>().unwrap(), OperatorCommand::Workers(12));
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["", "workers", "workers two", "batch a b", "state now", "reboot"] {
            assert!(line.parse::<OperatorCommand>().is_err(), "{line:?} parsed");
        }
    }
}
