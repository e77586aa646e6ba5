// Registers a batch code with the ledger.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use monitor_device::config::ledger_addr_from_env;
use monitor_device::connection::{LedgerClient, ServerConnection};

#[derive(Debug, Parser)]
#[command(name = "monitor-manager")]
#[command(about = "Associate a batch code with a batch name and print the new batch id", long_about = None)]
struct Args {
    /// Code printed on the batch, as entered at workstations
    batch_code: String,

    /// Human-readable batch name
    batch_name: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let addr = ledger_addr_from_env()?;
    let mut ledger =
        ServerConnection::connect(&addr).with_context(|| format!("cannot reach ledger at {addr}"))?;

    let batch_id = ledger.associate_batch(&args.batch_code, &args.batch_name)?;
    info!("Associated {:?} with {:?}", args.batch_code, args.batch_name);
    println!("{batch_id}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn parses_code_and_name() {
        let args = Args::try_parse_from(["monitor-manager", "B-17", "Pine 50x100"]).unwrap();
        assert_eq!(args.batch_code, "B-17");
        assert_eq!(args.batch_name, "Pine 50x100");
    }

    #[test]
    fn help_and_usage_errors() {
        let err = Args::try_parse_from(["monitor-manager", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = Args::try_parse_from(["monitor-manager", "B-17"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
