//! Verbose front end: same invocation as `kisstx`, but traces every
//! intermediate byte array as hex before (optionally) transmitting.

use anyhow::Context;
use clap::Parser;
use kisstx::{build_ui_packet, hex_dump, normalize_path, transmit, wrap_data_frame, Address};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kisstx-dump",
    version,
    about = "Encode an AX.25 UI frame, hex-dump each stage, then send it to a KISS-over-TCP TNC"
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

    /// Print the frame without opening a TNC connection
    #[arg(long)]
    no_send: bool,
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

    let tokens = normalize_path(&cli.path).context("invalid digipeater path")?;
    let destination = Address::parse_with(&cli.destination, cli.strict)
        .context("invalid destination address")?;
    let source =
        Address::parse_with(&cli.source, cli.strict).context("invalid source address")?;
    let digipeaters = tokens
        .iter()
        .map(|token| Address::parse_with(token, cli.strict))
        .collect::<kisstx::Result<Vec<_>>>()
        .context("invalid digipeater address")?;

    println!(
        "destination {:<10} {}",
        destination.to_string(),
        hex_dump(&destination.encode(false))
    );
    println!(
        "source      {:<10} {}",
        source.to_string(),
        hex_dump(&source.encode(digipeaters.is_empty()))
    );
    for (index, digipeater) in digipeaters.iter().enumerate() {
        println!(
            "digipeater  {:<10} {}",
            digipeater.to_string(),
            hex_dump(&digipeater.encode(index + 1 == digipeaters.len()))
        );
    }

    let packet = build_ui_packet(&destination, &source, &digipeaters, cli.message.as_bytes());
    println!("ax.25 packet  {}", hex_dump(&packet));
    println!("kiss frame    {}", hex_dump(&wrap_data_frame(&packet)));

    if !cli.no_send {
        transmit(cli.tnc, &packet, Duration::from_secs(cli.timeout))
            .with_context(|| format!("failed to send frame to {}", cli.tnc))?;
        println!("sent to {}", cli.tnc);
    }
    Ok(())
}
