//! roster - Active Directory account roster
//!
//! Lists every user principal in a domain with its active/inactive status
//! and, given a logon name, dumps that account's decoded attributes.

use clap::Parser;
use tracing::info;

use roster_core::report::{describe_account, enumerate_accounts};
use roster_ldap::LdapDirectory;

mod config;
mod error;
mod logging;

use config::RosterConfig;
use error::CliResult;

/// List directory accounts and their status
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Short logon name to dump in detail after the listing
    logon_name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    logging::init();

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = RosterConfig::from_env()?;

    info!(
        domain = %config.domain,
        url = %config.ldap.url(),
        "Starting roster"
    );

    let directory = LdapDirectory::new(config.ldap)?;

    let report = enumerate_accounts(&directory, &config.domain, |line| println!("{line}")).await?;
    if let Some(failure) = &report.connectivity_failure {
        println!("{failure}");
    }

    if let Some(logon_name) = cli.logon_name {
        let outcome = describe_account(&directory, &config.domain, &logon_name).await?;
        for line in outcome.lines() {
            println!("{line}");
        }
    }

    Ok(())
}
