//! Run command - record a session from the wireless master.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::RangedI64ValueParser;
use clap::Args;
use mtwlink::config::{MAX_RADIO_CHANNEL, MIN_RADIO_CHANNEL};
use mtwlink::controller::{ControllerConfig, ControllerError, MasterController, RunSummary};
use mtwlink::device::SimulatedControl;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::console;
use crate::error::CliError;
use crate::input::KeyboardOperator;
use crate::runner::CliRunner;
use crate::sink::ConsoleSink;

/// Printed once the controller has torn down and closed the control handle.
const CONTROL_CLOSED: &str = "Control handle closed.";

/// Arguments for the run command.
///
/// Every option left unset falls back to the config file.
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Number of simulated trackers attached to the master
    #[arg(long, default_value_t = 2)]
    pub trackers: usize,

    /// Desired update rate in Hz (the closest supported rate is used)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub update_rate: Option<u32>,

    /// Radio channel
    #[arg(long, value_parser = channel_parser())]
    pub channel: Option<u8>,

    /// Name of the recording file created by the master
    #[arg(long)]
    pub log_file: Option<String>,

    /// Start automatically once this many trackers are connected
    #[arg(long)]
    pub expect: Option<usize>,

    /// Print every Nth orientation batch
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub print_every: Option<u64>,

    /// Seconds to wait for trackers before giving up
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Seconds to wait for first data from every tracker
    #[arg(long)]
    pub first_data_timeout: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl RunArgs {
    /// Overlay the command line options on settings from the config file.
    pub fn apply(&self, mut config: ControllerConfig) -> ControllerConfig {
        if let Some(rate) = self.update_rate {
            config = config.with_update_rate(rate);
        }
        if let Some(channel) = self.channel {
            config = config.with_radio_channel(channel);
        }
        if let Some(name) = &self.log_file {
            config = config.with_log_file(name.clone());
        }
        if self.expect.is_some() {
            config = config.with_expected_trackers(self.expect);
        }
        if let Some(every) = self.print_every {
            config = config.with_publish_every(every);
        }
        if let Some(secs) = self.connect_timeout {
            config = config.with_connect_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(secs) = self.first_data_timeout {
            config = config.with_first_data_timeout(Some(Duration::from_secs(secs)));
        }
        config
    }
}

fn channel_parser() -> RangedI64ValueParser<u8> {
    RangedI64ValueParser::new().range(MIN_RADIO_CHANNEL as i64..=MAX_RADIO_CHANNEL as i64)
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("run");

    let config = args.apply(runner.config().controller_config());
    let interactive = atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout);
    if !interactive && config.expected_trackers.is_none() {
        return Err(CliError::Config(
            "no terminal to read the start key from; pass --expect N".to_string(),
        ));
    }

    info!(
        trackers = args.trackers,
        update_rate = config.update_rate,
        channel = config.radio_channel,
        log_file = %config.log_file,
        interactive,
        "Starting run"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mtwlink-runtime")
        .build()
        .map_err(CliError::Runtime)?;

    // Signal handler for graceful shutdown; in raw mode Ctrl+C arrives as a key instead
    let cancel = CancellationToken::new();
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || handler_cancel.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let control = Arc::new(SimulatedControl::with_trackers(args.trackers));
    let controller = MasterController::new(control, config);
    let mut sink = ConsoleSink::new();

    let mut operator = if interactive {
        KeyboardOperator::interactive(cancel.clone()).map_err(CliError::Terminal)?
    } else {
        KeyboardOperator::unattended(cancel.clone())
    };

    let outcome = runtime.block_on(async {
        if let Some(secs) = args.duration {
            let timer = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                info!(seconds = secs, "Run duration elapsed");
                timer.cancel();
            });
        }
        controller.run(&operator, &mut sink, cancel.clone()).await
    });

    operator.shutdown();

    match outcome {
        Ok(summary) => {
            print_summary(&summary, sink.batches());
            console::line(CONTROL_CLOSED);
            console::line("Successful exit.");
            Ok(())
        }
        Err(e) => {
            print_abort(&e);
            console::line(CONTROL_CLOSED);
            Err(CliError::Aborted(e))
        }
    }
}

fn print_summary(summary: &RunSummary, printed: u64) {
    console::line("");
    console::line(format!(
        "Recorded {} tracker(s) at {} Hz on channel {}",
        summary.trackers.len(),
        summary.update_rate,
        summary.radio_channel
    ));
    for (index, id) in summary.trackers.iter().enumerate() {
        console::line(format!("  [{}]: {}", index, id));
    }
    console::line(format!(
        "Drained {} packet(s), printed {} of {} batch(es)",
        summary.stats.packets_drained, printed, summary.stats.batches
    ));
}

/// Diagnostic line naming the failed step, its causes, then the abort banner.
fn print_abort(error: &ControllerError) {
    console::line(format!("Error: {}: {}", error.step(), error));
    let mut source = error.source();
    while let Some(cause) = source {
        console::line(format!("  caused by: {}", cause));
        source = cause.source();
    }
    console::line("****ABORT****");
}
