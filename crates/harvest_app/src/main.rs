use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use harvest_app::{logging, run, Args, HarvestConfig};
use harvest_logging::harvest_error;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::initialize(args.verbose, args.log_file);

    match try_main(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            harvest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: &Args) -> anyhow::Result<()> {
    let config = HarvestConfig::resolve(args).context("invalid configuration")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(run(&config))?;
    println!("{report}");
    Ok(())
}
