//! Silent front end: encode an AX.25 UI frame and send it to a
//! KISS-over-TCP TNC such as Dire Wolf.

use anyhow::Context;
use clap::Parser;
use kisstx::{encode_ui_frame_with, transmit, EncodeOptions};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kisstx",
    version,
    about = "Encode an AX.25 UI frame and send it to a KISS-over-TCP TNC"
)]
struct Cli {
    /// Source callsign, e.g. N0CALL-5
    source: String,

    /// Destination callsign, e.g. APRS
    destination: String,

    /// Payload text (quote it if it contains spaces)
    message: String,

    /// Digipeater path, as separate tokens or one comma-separated argument
    path: Vec<String>,

    /// TNC address
    #[arg(long, default_value = "127.0.0.1:8001")]
    tnc: SocketAddr,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Reject callsigns longer than six characters instead of truncating
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        use clap::error::ErrorKind;
        if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
            err.exit();
        }
        // Usage problems exit 1, not clap's default 2.
        let _ = err.print();
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = EncodeOptions {
        strict_validation: cli.strict,
    };
    let packet = encode_ui_frame_with(
        options,
        &cli.source,
        &cli.destination,
        cli.message.as_bytes(),
        &cli.path,
    )
    .context("failed to encode UI frame")?;
    debug!(bytes = packet.len(), "encoded AX.25 packet");

    transmit(cli.tnc, &packet, Duration::from_secs(cli.timeout))
        .with_context(|| format!("failed to send frame to {}", cli.tnc))?;
    debug!(tnc = %cli.tnc, "frame sent");
    Ok(())
}
