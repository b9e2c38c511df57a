// monitoring_main.rs
use crossing_arbiter::config::ArbiterConfig;
use crossing_arbiter::monitoring::arbiter_monitoring_system::run_cli;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config_path = std::env::args().nth(1);
    let config = ArbiterConfig::load_or_default(config_path.as_deref())?;
    run_cli(&config);
    Ok(())
}
