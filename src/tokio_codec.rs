use bytes::BytesMut;
use std::io::{self, Write};
use tokio_util::codec::Encoder;

use crate::{wrap_into_writer, FrameError, Result, CMD_DATA};

/// KISS framing encoder implementing [`tokio_util::codec::Encoder`].
///
/// Transmit side only: each item is stuffed and wrapped as a KISS data
/// frame on TNC port 0. UI frames are fire-and-forget, so no matching
/// [`Decoder`](tokio_util::codec::Decoder) is provided.
#[derive(Debug, Default)]
pub struct KissCodec;

impl KissCodec {
    /// Construct a new KISS codec.
    pub fn new() -> Self {
        Self
    }

    /// Encode a byte slice without taking ownership of it.
    pub fn encode_slice(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<()> {
        let mut writer = BytesMutWriter(dst);
        wrap_into_writer(item.iter().copied(), CMD_DATA, &mut writer)
    }
}

impl Encoder<Vec<u8>> for KissCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Vec<u8>, dst: &mut BytesMut) -> Result<()> {
        let mut writer = BytesMutWriter(dst);
        wrap_into_writer(item, CMD_DATA, &mut writer)
    }
}

struct BytesMutWriter<'a>(&'a mut BytesMut);

impl<'a> Write for BytesMutWriter<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_vec() {
        let mut codec = KissCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(b"abc".to_vec(), &mut dst).unwrap();
        assert_eq!(&dst[..], crate::wrap_data_frame(b"abc"));
    }

    #[test]
    fn encode_slice() {
        let mut codec = KissCodec::new();
        let mut dst = BytesMut::new();
        codec.encode_slice(b"data", &mut dst).unwrap();
        assert_eq!(&dst[..], crate::wrap_data_frame(b"data"));
    }

    #[test]
    fn encode_stuffs_specials() {
        let mut codec = KissCodec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(vec![crate::FEND, crate::FESC], &mut dst)
            .unwrap();
        assert_eq!(
            &dst[..],
            [
                crate::FEND,
                CMD_DATA,
                crate::FESC,
                crate::TFEND,
                crate::FESC,
                crate::TFESC,
                crate::FEND
            ]
        );
    }

    #[test]
    fn consecutive_frames_are_delimited() {
        let mut codec = KissCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(b"one".to_vec(), &mut dst).unwrap();
        codec.encode(b"two".to_vec(), &mut dst).unwrap();
        let expected = [crate::wrap_data_frame(b"one"), crate::wrap_data_frame(b"two")].concat();
        assert_eq!(&dst[..], expected);
    }
}
