use colored::*;

/// Print a relay reply with a colored prefix
pub fn print_reply(reply: &str) {
    println!("{}: {}", "Neelakshi".blue().bold(), reply);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "neelakshi-chat \"your message\"".green().bold());
    println!("    Send a single message to the relay");
    println!();
    println!("  {}", "neelakshi-chat -i".green().bold());
    println!("    Start an interactive chat session");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --url <URL>            Relay address (default http://127.0.0.1:10000)");
    println!("  --max-history <N>      History entries kept in interactive mode");
    println!("  --help                 Show this help message");
    println!();
}
