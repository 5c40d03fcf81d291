use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use buildconf::cli::{Cli, Command};
use buildconf::commands::{self, Layout};
use buildconf::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    match args.command {
        Command::Configure(opts) => {
            let layout = Layout::resolve(&args.global)?;
            let log_file = layout.log_file();
            init_subscriber(args.verbose, Some(&log_file));
            let log = Arc::new(Logger::new(Some(log_file)));
            commands::configure::run(&layout, &opts, &log)
        }
        Command::Status => commands::status::run(&args.global),
        Command::Emit(opts) => {
            init_subscriber(args.verbose, None);
            commands::emit::run(&args.global, &opts, &Logger::new(None))
        }
        Command::Clean => {
            init_subscriber(args.verbose, None);
            commands::clean::run(&args.global, &Logger::new(None))
        }
        Command::Completions(opts) => {
            commands::completions::run(&opts);
            Ok(())
        }
        Command::Version => commands::version::run(),
    }
}
