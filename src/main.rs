mod cli;
mod config;
mod error;
mod gate;
mod output;
mod reports;
mod runner;
mod serve;
mod stage;
#[cfg(test)]
mod testing;

use clap::Parser;
use cli::Cli;
use error::PipelineError;
use log::info;

#[tokio::main]
async fn main() {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting cigate - CI Stage Runner & Quality Gate");

    let result = tokio::select! {
        res = cli.execute() => res,
        _ = tokio::signal::ctrl_c() => {
            output::error("Interrupted, aborting run");
            std::process::exit(130);
        }
    };

    if let Err(err) = result {
        output::error(format!("{err:#}"));
        let code = err
            .downcast_ref::<PipelineError>()
            .map_or(1, PipelineError::exit_code);
        std::process::exit(code);
    }
}
