//! Send a single UI frame to a local KISS-over-TCP TNC.
//!
//! Expects a software TNC (e.g. Dire Wolf) listening on 127.0.0.1:8001.
//!
//! Run with:
//!
//! ```text
//! cargo run --example beacon
//! ```

use kisstx::{encode_ui_frame, transmit, Result};
use std::net::SocketAddr;
use std::time::Duration;

fn main() -> Result<()> {
    let tnc: SocketAddr = "127.0.0.1:8001".parse().unwrap();
    let packet = encode_ui_frame(
        "N0CALL-1",
        "BEACON",
        b"kisstx demo beacon",
        &["WIDE1-1", "WIDE2-2"],
    )?;
    transmit(tnc, &packet, Duration::from_secs(5))?;
    println!("Sent {} packet bytes to {tnc}", packet.len());
    Ok(())
}
