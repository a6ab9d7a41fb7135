#![doc = include_str!("../README.md")]

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use memchr::memchr2_iter;

#[cfg(feature = "tokio-codec")]
pub mod tokio_codec;

/// KISS frame delimiter FEND (0xC0).
pub const FEND: u8 = 0xC0;
/// KISS escape byte FESC (0xDB).
pub const FESC: u8 = 0xDB;
/// KISS transposed FEND (0xDC); follows [`FESC`] when the payload contained a literal 0xC0.
pub const TFEND: u8 = 0xDC;
/// KISS transposed FESC (0xDD); follows [`FESC`] when the payload contained a literal 0xDB.
pub const TFESC: u8 = 0xDD;

/// KISS "send data frame" command on TNC port 0.
pub const CMD_DATA: u8 = 0x00;

/// AX.25 control byte for an unnumbered information (UI) frame.
pub const CONTROL_UI: u8 = 0x03;
/// AX.25 protocol identifier for "no layer 3 protocol".
pub const PID_NO_LAYER3: u8 = 0xF0;

/// Pack a TNC port number and a KISS command into one command byte.
///
/// The high nybble selects the port, the low nybble the command.
///
/// ```
/// use kisstx::{command_byte, CMD_DATA};
///
/// assert_eq!(command_byte(0, CMD_DATA), 0x00);
/// assert_eq!(command_byte(1, CMD_DATA), 0x10);
/// ```
pub const fn command_byte(port: u8, command: u8) -> u8 {
    (port << 4) | (command & 0x0F)
}

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FrameError>;

/// Error type for AX.25/KISS encoding operations and the TNC transport boundary.
#[derive(Debug)]
#[non_exhaustive]
pub enum FrameError {
    /// Wrapper around [`std::io::Error`] originating from the underlying writer or socket.
    Io(io::Error),
    /// Address token contained no callsign characters.
    EmptyCallsign,
    /// Callsign longer than six characters while strict validation was requested.
    CallsignTooLong(String),
    /// SSID suffix did not parse as an integer in 0-15.
    InvalidSsid(String),
    /// A digipeater path contained a blank entry at the given position.
    EmptyPathEntry(usize),
    /// Input was too short to be a KISS frame or was missing its FEND delimiters.
    TruncatedFrame,
    /// Encountered a bare [`FEND`] inside a frame body.
    UnexpectedDelimiter,
    /// Encountered an invalid escape sequence while un-stuffing.
    InvalidEscape(u8),
    /// Encountered an [`FESC`] at the end of a frame body without a following escape code.
    IncompleteEscape,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Io(err) => write!(f, "I/O error: {err}"),
            FrameError::EmptyCallsign => write!(f, "callsign is empty"),
            FrameError::CallsignTooLong(call) => {
                write!(f, "callsign {call:?} is longer than six characters")
            }
            FrameError::InvalidSsid(ssid) => {
                write!(f, "invalid SSID {ssid:?}, expected an integer in 0-15")
            }
            FrameError::EmptyPathEntry(index) => {
                write!(f, "digipeater path entry {index} is blank")
            }
            FrameError::TruncatedFrame => write!(f, "input is not a complete KISS frame"),
            FrameError::UnexpectedDelimiter => {
                write!(f, "encountered a bare FEND inside a frame body")
            }
            FrameError::InvalidEscape(code) => {
                write!(f, "encountered invalid escape sequence 0x{code:02X}")
            }
            FrameError::IncompleteEscape => write!(f, "encountered incomplete escape sequence"),
        }
    }
}

impl Error for FrameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FrameError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(value: io::Error) -> Self {
        FrameError::Io(value)
    }
}

/// Options controlling how address tokens are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Reject callsigns longer than six characters instead of silently
    /// truncating them (the lenient legacy behavior, and the default).
    pub strict_validation: bool,
}

/// An AX.25 station address: callsign, SSID and the has-been-repeated flag.
///
/// Parsed from textual tokens such as `"N0CALL-5"` or `"WIDE1-1*"`. The
/// trailing `*` marks a digipeater hop that has already repeated the packet
/// and may appear anywhere in the token. Encodes to exactly 7 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    callsign: String,
    ssid: u8,
    repeated: bool,
}

impl Address {
    /// Parse an address token leniently: callsigns longer than six
    /// characters are truncated, matching the behavior packet tools have
    /// historically shown.
    ///
    /// ```
    /// use kisstx::Address;
    ///
    /// let addr = Address::parse("n0call-5").unwrap();
    /// assert_eq!(addr.callsign(), "N0CALL");
    /// assert_eq!(addr.ssid(), 5);
    /// assert!(!addr.is_repeated());
    /// ```
    pub fn parse(token: &str) -> Result<Self> {
        Self::parse_with(token, false)
    }

    /// Parse an address token; `strict` rejects over-long callsigns
    /// instead of truncating.
    pub fn parse_with(token: &str, strict: bool) -> Result<Self> {
        let mut token = token.trim().to_ascii_uppercase();

        // "WIDE1-1*" and "WIDE1*-1" are equivalent: the marker is
        // position independent.
        let repeated = token.contains('*');
        if repeated {
            token.retain(|c| c != '*');
        }

        let (callsign, ssid) = match token.split_once('-') {
            Some((callsign, ssid)) => {
                let ssid = ssid
                    .parse::<u8>()
                    .ok()
                    .filter(|&value| value <= 15)
                    .ok_or_else(|| FrameError::InvalidSsid(ssid.to_string()))?;
                (callsign, ssid)
            }
            None => (token.as_str(), 0),
        };

        if callsign.is_empty() {
            return Err(FrameError::EmptyCallsign);
        }
        let callsign = if callsign.chars().count() > 6 {
            if strict {
                return Err(FrameError::CallsignTooLong(callsign.to_string()));
            }
            callsign.chars().take(6).collect()
        } else {
            callsign.to_string()
        };

        Ok(Self {
            callsign,
            ssid,
            repeated,
        })
    }

    /// The normalized (uppercase, at most six character) callsign.
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// The secondary station identifier, 0-15.
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// `true` when the token carried the `*` has-been-repeated marker.
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Encode this address as the fixed 7-byte AX.25 address field.
    ///
    /// Bytes 0-5 are the space-padded callsign characters shifted left one
    /// bit (the low bit is the HDLC extension bit and stays 0 inside a
    /// character). Byte 6 carries the SSID in bits 1-4, the reserved bits
    /// 0x60, the extension bit when `is_final`, and 0x80 when the address
    /// has been repeated.
    pub fn encode(&self, is_final: bool) -> [u8; 7] {
        let mut out = [b' ' << 1; 7];
        for (slot, &byte) in out.iter_mut().zip(self.callsign.as_bytes().iter().take(6)) {
            *slot = byte << 1;
        }

        let mut ssid = (self.ssid << 1) | 0x60;
        if is_final {
            ssid |= 0x01;
        }
        if self.repeated {
            ssid |= 0x80;
        }
        out[6] = ssid;
        out
    }
}

impl std::str::FromStr for Address {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.callsign)?;
        if self.ssid > 0 {
            write!(f, "-{}", self.ssid)?;
        }
        if self.repeated {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Parse and encode an address token in one step.
///
/// ```
/// let field = kisstx::encode_address("N0CALL", true).unwrap();
/// assert_eq!(field.len(), 7);
/// assert_eq!(field[6], 0x61);
/// ```
pub fn encode_address(token: &str, is_final: bool) -> Result<[u8; 7]> {
    Ok(Address::parse(token)?.encode(is_final))
}

/// Normalize a digipeater path argument into an ordered list of tokens.
///
/// A single-element path is split on commas, so `["WIDE1-1,WIDE2-2"]` and
/// `["WIDE1-1", "WIDE2-2"]` produce the same list. A single empty token
/// means "no path". Blank entries anywhere else are rejected.
pub fn normalize_path<S>(path: &[S]) -> Result<Vec<String>>
where
    S: AsRef<str>,
{
    let tokens: Vec<String> = if path.len() == 1 {
        path[0]
            .as_ref()
            .split(',')
            .map(|token| token.trim().to_string())
            .collect()
    } else {
        path.iter()
            .map(|token| token.as_ref().trim().to_string())
            .collect()
    };

    if tokens.len() == 1 && tokens[0].is_empty() {
        return Ok(Vec::new());
    }
    for (index, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            return Err(FrameError::EmptyPathEntry(index));
        }
    }
    Ok(tokens)
}

/// Assemble an unescaped AX.25 UI packet from already-parsed addresses.
///
/// Layout: `dest(7) || src(7) || digi(7)* || 0x03 || 0xF0 || message`.
/// The destination is never marked final; with an empty path the source
/// terminates the address header, otherwise the last digipeater does.
pub fn build_ui_packet(
    destination: &Address,
    source: &Address,
    path: &[Address],
    message: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(7 * (2 + path.len()) + 2 + message.len());
    out.extend_from_slice(&destination.encode(false));
    out.extend_from_slice(&source.encode(path.is_empty()));
    for (index, digipeater) in path.iter().enumerate() {
        out.extend_from_slice(&digipeater.encode(index + 1 == path.len()));
    }
    out.push(CONTROL_UI);
    out.push(PID_NO_LAYER3);
    out.extend_from_slice(message);
    out
}

/// Encode a UI frame from textual address tokens with lenient validation.
///
/// The returned packet is unescaped AX.25; pass it to [`wrap_data_frame`]
/// or [`KissWriter::write_frame`] to produce the on-wire KISS frame.
///
/// ```
/// let packet = kisstx::encode_ui_frame("N0CALL", "APRS", b"hi", &["WIDE1-1"]).unwrap();
/// assert_eq!(packet.len(), 7 * 3 + 2 + 2);
/// ```
pub fn encode_ui_frame<S>(
    source: &str,
    destination: &str,
    message: &[u8],
    path: &[S],
) -> Result<Vec<u8>>
where
    S: AsRef<str>,
{
    encode_ui_frame_with(EncodeOptions::default(), source, destination, message, path)
}

/// Encode a UI frame with explicit [`EncodeOptions`].
///
/// Any address failure aborts the whole build; no partial packet is ever
/// returned.
pub fn encode_ui_frame_with<S>(
    options: EncodeOptions,
    source: &str,
    destination: &str,
    message: &[u8],
    path: &[S],
) -> Result<Vec<u8>>
where
    S: AsRef<str>,
{
    let tokens = normalize_path(path)?;
    let destination = Address::parse_with(destination, options.strict_validation)?;
    let source = Address::parse_with(source, options.strict_validation)?;
    let digipeaters = tokens
        .iter()
        .map(|token| Address::parse_with(token, options.strict_validation))
        .collect::<Result<Vec<_>>>()?;
    Ok(build_ui_packet(
        &destination,
        &source,
        &digipeaters,
        message,
    ))
}

/// Byte-stuff a packet and wrap it as a KISS frame with the given command
/// byte, returning the encoded data as a newly allocated [`Vec`].
///
/// Pure and total: every byte value has a defined stuffing rule. The
/// command byte is emitted verbatim between the opening [`FEND`] and the
/// stuffed body.
pub fn wrap_frame(packet: &[u8], command: u8) -> Vec<u8> {
    // Fast path for slices: pre-size and scan using memchr2.
    let mut out = Vec::with_capacity(wrapped_len_bytes(packet));
    out.push(FEND);
    out.push(command);
    let mut start = 0usize;
    for pos in memchr2_iter(FEND, FESC, packet) {
        if pos > start {
            out.extend_from_slice(&packet[start..pos]);
        }
        match packet[pos] {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            _ => unreachable!(),
        }
        start = pos + 1;
    }
    if start < packet.len() {
        out.extend_from_slice(&packet[start..]);
    }
    out.push(FEND);
    out
}

/// Wrap a packet as a KISS data frame on TNC port 0.
pub fn wrap_data_frame(packet: &[u8]) -> Vec<u8> {
    wrap_frame(packet, CMD_DATA)
}

/// Byte-stuff an arbitrary iterator of bytes and write the framed result
/// directly into the provided writer.
pub fn wrap_into_writer<I, W>(input: I, command: u8, writer: &mut W) -> Result<()>
where
    I: IntoIterator<Item = u8>,
    W: Write,
{
    writer.write_all(&[FEND, command])?;
    for byte in input {
        match byte {
            FEND => writer.write_all(&[FESC, TFEND])?,
            FESC => writer.write_all(&[FESC, TFESC])?,
            value => writer.write_all(&[value])?,
        }
    }
    writer.write_all(&[FEND])?;
    Ok(())
}

/// Compute the wrapped length (delimiters and command byte included)
/// without allocating.
///
/// ```
/// use kisstx::{wrapped_len, FEND, FESC};
///
/// assert_eq!(wrapped_len([FEND, FESC, 0x01]), 8);
/// ```
pub fn wrapped_len<I>(input: I) -> usize
where
    I: IntoIterator<Item = u8>,
{
    // FEND, command byte and trailing FEND.
    let mut len = 3;
    for byte in input {
        len += match byte {
            FEND | FESC => 2,
            _ => 1,
        };
    }
    len
}

/// Optimized wrapped length for byte slices.
fn wrapped_len_bytes(packet: &[u8]) -> usize {
    // Each FEND/FESC expands to two bytes; others stay as one.
    let mut count = 0usize;
    for _ in memchr2_iter(FEND, FESC, packet) {
        count += 1;
    }
    packet.len() + count + 3
}

/// Reverse the stuffing rule on a frame body (the bytes between the
/// command byte and the closing delimiter).
///
/// This is the inverse of the stuffing applied by [`wrap_frame`], provided
/// for loopback verification and diagnostics; this crate has no frame
/// reception path.
pub fn unstuff(body: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut escape_pending = false;
    for &byte in body {
        if escape_pending {
            match byte {
                TFEND => out.push(FEND),
                TFESC => out.push(FESC),
                invalid => return Err(FrameError::InvalidEscape(invalid)),
            }
            escape_pending = false;
            continue;
        }
        match byte {
            FESC => escape_pending = true,
            FEND => return Err(FrameError::UnexpectedDelimiter),
            value => out.push(value),
        }
    }
    if escape_pending {
        return Err(FrameError::IncompleteEscape);
    }
    Ok(out)
}

/// Split a complete KISS frame into its command byte and un-stuffed payload.
///
/// ```
/// use kisstx::{unwrap_frame, wrap_frame, FEND};
///
/// let frame = wrap_frame(&[0x01, FEND, 0x02], 0x00);
/// let (command, payload) = unwrap_frame(&frame).unwrap();
/// assert_eq!(command, 0x00);
/// assert_eq!(payload, vec![0x01, FEND, 0x02]);
/// ```
pub fn unwrap_frame(frame: &[u8]) -> Result<(u8, Vec<u8>)> {
    if frame.len() < 3 || frame[0] != FEND || frame[frame.len() - 1] != FEND {
        return Err(FrameError::TruncatedFrame);
    }
    let command = frame[1];
    let payload = unstuff(&frame[2..frame.len() - 1])?;
    Ok((command, payload))
}

/// Render bytes as space-separated uppercase hex pairs.
///
/// Used by the verbose front end to trace intermediate byte arrays; the
/// silent transmit path never calls it.
pub fn hex_dump(bytes: &[u8]) -> String {
    use fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        write!(out, "{byte:02X}").expect("writing to a String cannot fail");
    }
    out
}

/// Writer wrapper that stuffs and frames outgoing packets as KISS before
/// forwarding them to the underlying writer.
///
/// The wrapper does not buffer beyond the stuffing that KISS requires.
/// Each call to [`write_frame`](KissWriter::write_frame) appends a single
/// KISS frame to the wrapped writer.
pub struct KissWriter<W> {
    inner: W,
}

impl<W> KissWriter<W> {
    /// Construct a new KISS writer around the provided sink.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Retrieve an immutable reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Retrieve a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> KissWriter<W> {
    /// Wrap the provided packet as a KISS data frame on port 0 and write
    /// it to the underlying sink.
    pub fn write_frame(&mut self, packet: &[u8]) -> Result<()> {
        self.write_frame_with_command(packet, CMD_DATA)
    }

    /// Wrap the provided packet with an explicit command byte and write it.
    pub fn write_frame_with_command(&mut self, packet: &[u8], command: u8) -> Result<()> {
        // Encode up front and write once to reduce syscall overhead.
        let frame = wrap_frame(packet, command);
        self.inner.write_all(&frame).map_err(FrameError::from)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(FrameError::from)
    }
}

/// Connect to a KISS-over-TCP TNC, transmit one data frame and close the
/// connection.
///
/// Fire and forget: UI frames are unacknowledged, so a send failure is
/// reported to the caller and never retried or queued. The connection
/// attempt is bounded by `timeout`; the packet must already be a complete
/// unescaped AX.25 packet (see [`encode_ui_frame`]), so no bytes reach the
/// socket unless encoding already succeeded.
pub fn transmit(addr: SocketAddr, packet: &[u8], timeout: Duration) -> Result<()> {
    let stream = TcpStream::connect_timeout(&addr, timeout)?;
    let mut writer = KissWriter::new(stream);
    writer.write_frame(packet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shifted(text: &str) -> Vec<u8> {
        text.bytes().map(|b| b << 1).collect()
    }

    #[test]
    fn address_is_seven_bytes_and_roundtrips() {
        for (token, callsign, ssid) in [
            ("A", "A", 0u8),
            ("N0CALL", "N0CALL", 0),
            ("N0CALL-5", "N0CALL", 5),
            ("WIDE1-1", "WIDE1", 1),
            ("W1AW-15", "W1AW", 15),
        ] {
            let field = encode_address(token, false).unwrap();
            assert_eq!(field.len(), 7);

            // Reverse the shift and mask the SSID bits to recover the input.
            let decoded: String = field[..6].iter().map(|&b| (b >> 1) as char).collect();
            assert_eq!(decoded.trim_end(), callsign);
            assert_eq!((field[6] >> 1) & 0x0F, ssid);
        }
    }

    #[test]
    fn final_bit_tracks_flag() {
        let addr = Address::parse("N0CALL-5").unwrap();
        assert_eq!(addr.encode(false)[6] & 0x01, 0);
        assert_eq!(addr.encode(true)[6] & 0x01, 1);
    }

    #[test]
    fn repeated_bit_from_star_marker() {
        let plain = Address::parse("WIDE1-1").unwrap();
        assert!(!plain.is_repeated());
        assert_eq!(plain.encode(false)[6] & 0x80, 0);

        let repeated = Address::parse("WIDE1-1*").unwrap();
        assert!(repeated.is_repeated());
        assert_eq!(repeated.encode(false)[6] & 0x80, 0x80);
    }

    #[test]
    fn star_marker_is_position_independent() {
        let trailing = Address::parse("WIDE1-1*").unwrap();
        let embedded = Address::parse("WIDE1*-1").unwrap();
        assert_eq!(trailing, embedded);
        assert_eq!(trailing.callsign(), "WIDE1");
        assert_eq!(trailing.ssid(), 1);
    }

    #[test]
    fn missing_separator_defaults_to_ssid_zero() {
        let addr = Address::parse("N0CALL").unwrap();
        assert_eq!(addr.ssid(), 0);
        assert_eq!(addr.encode(false)[6], 0x60);
    }

    #[test]
    fn lowercase_tokens_are_normalized() {
        let addr = Address::parse("n0call-5").unwrap();
        assert_eq!(addr.callsign(), "N0CALL");
    }

    #[test]
    fn long_callsign_truncates_by_default() {
        let addr = Address::parse("TOOLONGCALL-5").unwrap();
        assert_eq!(addr.callsign(), "TOOLON");
        assert_eq!(addr.ssid(), 5);
    }

    #[test]
    fn long_callsign_rejected_in_strict_mode() {
        let err = Address::parse_with("TOOLONGCALL-5", true).unwrap_err();
        assert!(matches!(err, FrameError::CallsignTooLong(call) if call == "TOOLONGCALL"));
    }

    #[test]
    fn malformed_ssid_is_rejected() {
        assert!(matches!(
            Address::parse("N0CALL-X").unwrap_err(),
            FrameError::InvalidSsid(_)
        ));
        assert!(matches!(
            Address::parse("N0CALL-16").unwrap_err(),
            FrameError::InvalidSsid(_)
        ));
        assert!(matches!(
            Address::parse("N0CALL-1-2").unwrap_err(),
            FrameError::InvalidSsid(_)
        ));
    }

    #[test]
    fn empty_callsign_is_rejected() {
        assert!(matches!(
            Address::parse("-5").unwrap_err(),
            FrameError::EmptyCallsign
        ));
        assert!(matches!(
            Address::parse("*").unwrap_err(),
            FrameError::EmptyCallsign
        ));
    }

    #[test]
    fn address_display_format() {
        assert_eq!(Address::parse("N0CALL").unwrap().to_string(), "N0CALL");
        assert_eq!(Address::parse("N0CALL-5").unwrap().to_string(), "N0CALL-5");
        assert_eq!(Address::parse("WIDE1-1*").unwrap().to_string(), "WIDE1-1*");
    }

    #[test]
    fn path_comma_string_and_list_normalize_identically() {
        let from_string = normalize_path(&["WIDE1-1,WIDE2-2"]).unwrap();
        let from_list = normalize_path(&["WIDE1-1", "WIDE2-2"]).unwrap();
        assert_eq!(from_string, from_list);
        assert_eq!(from_string, vec!["WIDE1-1", "WIDE2-2"]);
    }

    #[test]
    fn empty_path_forms() {
        assert!(normalize_path(&[] as &[&str]).unwrap().is_empty());
        assert!(normalize_path(&[""]).unwrap().is_empty());
    }

    #[test]
    fn blank_path_entry_is_rejected() {
        let err = normalize_path(&["WIDE1-1,,WIDE2-2"]).unwrap_err();
        assert!(matches!(err, FrameError::EmptyPathEntry(1)));
    }

    #[test]
    fn ui_frame_without_path_marks_source_final() {
        let packet = encode_ui_frame("N0CALL", "TEST", b"hello", &[] as &[&str]).unwrap();

        let mut expected = Vec::new();
        expected.extend(shifted("TEST  "));
        expected.push(0x60);
        expected.extend(shifted("N0CALL"));
        expected.push(0x61);
        expected.push(CONTROL_UI);
        expected.push(PID_NO_LAYER3);
        expected.extend_from_slice(b"hello");
        assert_eq!(packet, expected);

        let frame = wrap_data_frame(&packet);
        assert_eq!(frame[0], FEND);
        assert_eq!(frame[1], CMD_DATA);
        assert_eq!(*frame.last().unwrap(), FEND);
        // No specials in this packet, so the body passes through unchanged.
        assert_eq!(&frame[2..frame.len() - 1], &packet[..]);
    }

    #[test]
    fn ui_frame_with_path_marks_last_digipeater_final() {
        let packet =
            encode_ui_frame("N0CALL", "TEST", b"hi", &["WIDE1-1", "WIDE2-2"]).unwrap();

        // Source no longer terminates the address header.
        assert_eq!(packet[13], 0x60);
        // WIDE1-1 is not final, WIDE2-2 is.
        assert_eq!(packet[20], (1 << 1) | 0x60);
        assert_eq!(packet[27], (2 << 1) | 0x60 | 0x01);
        assert_eq!(packet[28], CONTROL_UI);
        assert_eq!(packet[29], PID_NO_LAYER3);
    }

    #[test]
    fn ui_frame_address_failure_aborts_build() {
        let err = encode_ui_frame("N0CALL", "TEST", b"hi", &["WIDE1-Q"]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidSsid(_)));
    }

    #[test]
    fn wrap_escapes_specials() {
        let frame = wrap_frame(&[FEND, FESC, 0x01], CMD_DATA);
        assert_eq!(
            frame,
            vec![FEND, CMD_DATA, FESC, TFEND, FESC, TFESC, 0x01, FEND]
        );
    }

    #[test]
    fn payload_with_fend_is_stuffed() {
        let packet = encode_ui_frame("N0CALL", "TEST", &[b'a', FEND, b'b'], &[] as &[&str])
            .unwrap();
        let frame = wrap_data_frame(&packet);

        // The body contains the escape sequence and never a bare FEND.
        let body = &frame[2..frame.len() - 1];
        assert!(body.windows(2).any(|pair| pair == [FESC, TFEND]));
        assert!(!body.contains(&FEND));
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let payloads: [&[u8]; 4] = [
            b"plain ascii",
            &[FEND, FESC, TFEND, TFESC],
            &[],
            &[0x00, 0xFF, FEND, 0x7F, FESC],
        ];
        for payload in payloads {
            let frame = wrap_frame(payload, CMD_DATA);
            let (command, decoded) = unwrap_frame(&frame).unwrap();
            assert_eq!(command, CMD_DATA);
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn wrap_into_writer_matches_slice_encoder() {
        let packet = [0x01, FEND, 0x02, FESC, 0x03];
        let mut out = Vec::new();
        wrap_into_writer(packet.iter().copied(), CMD_DATA, &mut out).unwrap();
        assert_eq!(out, wrap_frame(&packet, CMD_DATA));
    }

    #[test]
    fn wrapped_len_counts_escapes() {
        assert_eq!(wrapped_len([FEND, FESC, 0x01]), 8);
        assert_eq!(wrapped_len([]), 3);
        let packet = [0x01, FEND, 0x02];
        assert_eq!(wrap_frame(&packet, CMD_DATA).len(), wrapped_len(packet));
    }

    #[test]
    fn unstuff_rejects_malformed_bodies() {
        assert!(matches!(
            unstuff(&[FESC, 0x01]).unwrap_err(),
            FrameError::InvalidEscape(0x01)
        ));
        assert!(matches!(
            unstuff(&[0x01, FESC]).unwrap_err(),
            FrameError::IncompleteEscape
        ));
        assert!(matches!(
            unstuff(&[0x01, FEND, 0x02]).unwrap_err(),
            FrameError::UnexpectedDelimiter
        ));
    }

    #[test]
    fn unwrap_rejects_undelimited_input() {
        assert!(matches!(
            unwrap_frame(&[0x01, 0x02]).unwrap_err(),
            FrameError::TruncatedFrame
        ));
        assert!(matches!(
            unwrap_frame(&[FEND, CMD_DATA, 0x01]).unwrap_err(),
            FrameError::TruncatedFrame
        ));
    }

    #[test]
    fn command_byte_packs_port_in_high_nybble() {
        assert_eq!(command_byte(0, CMD_DATA), 0x00);
        assert_eq!(command_byte(2, CMD_DATA), 0x20);
        assert_eq!(command_byte(1, 0x03), 0x13);
    }

    #[test]
    fn writer_emits_complete_frames() {
        let mut writer = KissWriter::new(Vec::new());
        writer.write_frame(b"first").unwrap();
        writer.write_frame(&[FEND]).unwrap();
        let bytes = writer.into_inner();

        let expected = [wrap_data_frame(b"first"), wrap_data_frame(&[FEND])].concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn end_to_end_wire_format() {
        let packet = encode_ui_frame("N0CALL", "TEST", b"hello", &[] as &[&str]).unwrap();
        let frame = wrap_data_frame(&packet);

        let expected = vec![
            0xC0, 0x00, // FEND, data frame on port 0
            0xA8, 0x8A, 0xA6, 0xA8, 0x40, 0x40, 0x60, // TEST
            0x9C, 0x60, 0x86, 0x82, 0x98, 0x98, 0x61, // N0CALL, final
            0x03, 0xF0, // UI control, no layer 3
            0x68, 0x65, 0x6C, 0x6C, 0x6F, // hello
            0xC0,
        ];
        assert_eq!(frame, expected);
    }

    #[test]
    fn hex_dump_is_space_separated_uppercase() {
        assert_eq!(hex_dump(&[0xC0, 0x00, 0x5A]), "C0 00 5A");
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn build_from_parsed_addresses_matches_token_api() {
        let destination = Address::parse("APRS").unwrap();
        let source = Address::parse("N0CALL-7").unwrap();
        let path = vec![Address::parse("WIDE1-1").unwrap()];
        let built = build_ui_packet(&destination, &source, &path, b"payload");
        let encoded = encode_ui_frame("N0CALL-7", "APRS", b"payload", &["WIDE1-1"]).unwrap();
        assert_eq!(built, encoded);
    }
}
