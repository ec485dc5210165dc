use anyhow::Result;
use clap::Parser;

use wxstore_cli::{load_config, run, Cli};
use wxstore_obs::LogFormat;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    // Observability
    wxstore_obs::init("wxstore", LogFormat::from_json_flag(cfg.log_json()));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&cli, &cfg, &mut out)
}
