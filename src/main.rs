#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use turn_offload::config::{Cli, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref())?;
    simple_logger::init_with_level(config.log.level.as_level())?;

    if cli.frames.is_empty() {
        log::warn!("No frames given, there is nothing to replay.");

        return Ok(());
    }

    turn_offload::startup(&config, &cli)?;
    Ok(())
}
