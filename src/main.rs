use std::sync::Arc;

use lmsportal::commands::{Command, USAGE};
use lmsportal::config::{load_config, print_schema};
use lmsportal::startup::run;
use lmsportal::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--schema") {
        print_schema();
        return;
    }

    let command = match Command::parse(args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if !command.needs_session() {
        println!("{}", USAGE);
        return;
    }

    let config = Arc::new(load_config());
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config, command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
