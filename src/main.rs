use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, LevelFilter};

use notepad::{App, Cli, Config, FileKeyValueStore, NoteStorage, NoteStore};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    debug!("Logger initialized");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", e.user_message(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    info!("Using data directory {}", config.data_dir.display());
    let storage = NoteStorage::new(FileKeyValueStore::new(&config.data_dir))
        .pretty(config.pretty_storage);
    let store = NoteStore::load(storage).with_sort(config.default_sort);

    let mut app = App::new(store, config, config_path, cli.verbose);
    match app.run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if log::max_level() >= LevelFilter::Debug {
                eprintln!("{}: {}", e.user_message(), e);
            } else {
                eprintln!("{}", e.user_message());
            }
            ExitCode::FAILURE
        }
    }
}
