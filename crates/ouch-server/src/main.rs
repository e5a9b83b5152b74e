//! OUCH 4.2 order-entry simulator.
//!
//! Exit codes: 0 after a signal-driven shutdown or `--help`/`--version`,
//! 1 on bad arguments, 2 on startup failure.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};
use ouch_server::{Config, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ouch-simulator", about = "OUCH 4.2 order-entry simulator", version)]
struct Cli {
    /// TCP port to listen on
    #[arg(short, long, default_value_t = Config::DEFAULT_PORT)]
    port: u16,

    /// Log every read and every reply
    #[arg(short, long)]
    trace_messages: bool,
}

fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            error!(error = %err, "could not create runtime");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

/// Parse arguments, with `-v` standing in for clap's `-V`.
fn parse_cli() -> Result<Cli, ExitCode> {
    let mut cmd = Cli::command().disable_version_flag(true).arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    );

    let parsed = cmd
        .try_get_matches_from_mut(std::env::args_os())
        .and_then(|matches| Cli::from_arg_matches(&matches));

    parsed.map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            println!("{err}");
            ExitCode::from(1)
        }
    })
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("loading configuration")?;
    config.port = cli.port;
    config.trace_messages = cli.trace_messages;

    let server = Server::bind(config).await;
    let shutdown = server.shutdown_handle();

    let signals = signals::ShutdownSignals::install().context("installing signal handlers")?;
    tokio::spawn(async move {
        let name = signals.recv().await;
        info!(signal = name, "shutting down");
        shutdown.shutdown();
    });

    server.run().await;
    Ok(())
}

#[cfg(unix)]
mod signals {
    use std::io;

    use tokio::signal::unix::{signal, Signal, SignalKind};
    use tracing::debug;

    /// SIGINT and SIGTERM stop the server; SIGHUP is swallowed.
    pub struct ShutdownSignals {
        interrupt: Signal,
        terminate: Signal,
        hangup: Signal,
    }

    impl ShutdownSignals {
        pub fn install() -> io::Result<Self> {
            Ok(ShutdownSignals {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
                hangup: signal(SignalKind::hangup())?,
            })
        }

        pub async fn recv(mut self) -> &'static str {
            loop {
                tokio::select! {
                    _ = self.interrupt.recv() => return "SIGINT",
                    _ = self.terminate.recv() => return "SIGTERM",
                    _ = self.hangup.recv() => debug!("SIGHUP ignored"),
                }
            }
        }
    }
}

#[cfg(not(unix))]
mod signals {
    use std::io;

    pub struct ShutdownSignals;

    impl ShutdownSignals {
        pub fn install() -> io::Result<Self> {
            Ok(ShutdownSignals)
        }

        pub async fn recv(self) -> &'static str {
            let _ = tokio::signal::ctrl_c().await;
            "ctrl-c"
        }
    }
}
