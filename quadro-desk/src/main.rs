mod cli;
mod commands;
mod paths;

use std::process::ExitCode;

use clap::Parser;
use quadro_core::config::load_config;
use quadro_core::storage::local::LocalStorage;
use quadro_core::WorkspaceStore;

use crate::cli::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(paths::default_config_path);
    let data_dir = cli.data.unwrap_or_else(paths::default_data_dir);

    let config = load_config(&config_path);
    let storage = match LocalStorage::new(&data_dir) {
        Ok(storage) => storage,
        Err(e) => {
            log::error!("[quadro.desk] Cannot open data dir {}: {}", data_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut store = WorkspaceStore::load(storage, config);

    match commands::run(&mut store, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
