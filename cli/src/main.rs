use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod output;
mod relay_client;

use crate::cli::Args;
use crate::output::{print_error, print_usage_instructions};
use crate::relay_client::RelayClient;

fn init_logging(verbose: bool) {
    // Quiet unless asked, so log lines don't interleave with the chat
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(args.verbose);

    let client = match RelayClient::new(&args.url) {
        Ok(client) => client,
        Err(e) => {
            print_error(&format!("{:#}", e));
            return Err(e);
        }
    };

    if args.interactive {
        crate::app::run_interactive_chat(&client, args.max_history).await?;
    } else if let Some(prompt) = args.prompt {
        if let Err(e) = crate::app::run_single_query(prompt, &client).await {
            print_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    } else {
        print_usage_instructions();
    }

    Ok(())
}
