use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;

use tips_account::{init_tracing, AccountLookup, InvocationContext, TipsConfig};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 || args[1] == "-h" || args[1] == "--help" {
        eprintln!("Usage: tips-account <account-number>");
        eprintln!("   Looks up one account in TIPS and prints the JSON response.");
        eprintln!("   Requires TIPS_URL in the environment.");
        return Ok(ExitCode::from(2));
    }

    let config = TipsConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_level);

    let lookup = AccountLookup::new(&config).context("Failed to build HTTP client")?;
    let response = lookup
        .get_account(Some(args[1].as_str()), &InvocationContext::new())
        .await;

    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
