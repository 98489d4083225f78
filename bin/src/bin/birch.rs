use birch_bin::{
    cli::{Cli, Command},
    commands,
};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    let log_guard = birch_log::init(birch_log::LogConfig {
        log_file_path: cli.log_file,
    });
    if let Err(e) = &log_guard {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let result = match cli.command {
        Command::Validate { file } => commands::validate(&file),
        Command::Format { file, write } => commands::format(&file, write),
        Command::Outline { file, depth } => commands::outline(&file, depth),
        Command::Set { file, path, value } => commands::set(&file, &path, &value),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
