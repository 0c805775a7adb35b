// src/main.rs

mod probe_cli;

use log::{debug, error};
use env_logger::Env;
use cacheprobe::config::ProbeConfig;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let options = match probe_cli::CliOptions::parse(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}\n{}", message, probe_cli::usage());
            std::process::exit(1);
        }
    };

    // Logger level comes from the config, so read it before the logger exists
    let loaded = probe_cli::load_config(&options);
    let log_level = loaded.as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize the logger
    let env = Env::default()
        .filter_or("CACHEPROBE_LOG", log_level)
        .write_style_or("CACHEPROBE_LOG_STYLE", "auto");

    env_logger::Builder::from_env(env).init();

    let config: ProbeConfig = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    debug!("Configuration: {:?}", config);

    std::process::exit(probe_cli::run(&options, &config));
}
