use kisstx::{encode_ui_frame, hex_dump, unwrap_frame, wrap_data_frame, Result};

fn main() -> Result<()> {
    let packet = encode_ui_frame("N0CALL", "APRS", b"hello, kiss", &["WIDE1-1"])?;
    println!("AX.25 packet: {}", hex_dump(&packet));

    let frame = wrap_data_frame(&packet);
    println!("KISS frame:   {}", hex_dump(&frame));

    let (command, payload) = unwrap_frame(&frame)?;
    println!("command 0x{command:02X}, {} payload bytes", payload.len());
    Ok(())
}
