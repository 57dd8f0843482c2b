use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use socks5_gateway::cli::Cli;
use socks5_gateway::config::Configuration;
use socks5_gateway::logging;
use socks5_gateway::resolver::SystemResolver;
use socks5_gateway::server::Server;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Configuration::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.loglevel.bumped(cli.verbose), config.logformat);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let server = Server::new(Arc::new(config)).with_resolver(Arc::new(SystemResolver));

    match runtime.block_on(server.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
