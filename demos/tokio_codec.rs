#[cfg(not(feature = "tokio-codec"))]
fn main() {
    eprintln!(
        "Enable the `tokio-codec` feature to build this example:\n    cargo run --example tokio_codec --features tokio-codec"
    );
}

#[cfg(feature = "tokio-codec")]
fn main() -> kisstx::Result<()> {
    use bytes::BytesMut;
    use kisstx::tokio_codec::KissCodec;
    use tokio_util::codec::Encoder;

    let packet = kisstx::encode_ui_frame("N0CALL", "APRS", b"codec demo", &[] as &[&str])?;

    let mut codec = KissCodec::new();
    let mut dst = BytesMut::new();
    codec.encode(packet, &mut dst)?;

    println!("Encoded KISS frame: {}", kisstx::hex_dump(&dst));
    Ok(())
}
