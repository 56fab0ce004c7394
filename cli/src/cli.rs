use clap::Parser;

/// Terminal chat client for the Neelakshi relay
#[derive(Parser, Debug)]
#[command(name = "neelakshi-chat", author, version, about, long_about = None)]
pub struct Args {
    /// The message to send
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Base URL of the relay
    #[arg(long, env = "NEELAKSHI_URL", default_value = "http://127.0.0.1:10000")]
    pub url: String,

    /// Most history entries sent with each message in interactive mode
    #[arg(long, default_value_t = 20)]
    pub max_history: usize,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
