// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire obfuscation and framing.
//!
//! Every message on port 9999 is a 4-byte big-endian length of the plaintext
//! followed by the plaintext run through an autokey XOR stream: the key
//! starts at 171 and is replaced by each ciphertext byte as it is produced
//! or consumed.
//!
//! This hides nothing from anyone who knows the scheme. It is framing, not
//! security.
//!
//! # Examples
//!
//! ```
//! use kasa_lan::protocol::codec::{decode, encode};
//!
//! let wire = encode(r#"{"system":{"get_sysinfo":{}}}"#);
//! assert_eq!(&wire[..4], &[0, 0, 0, 29]);
//! assert_eq!(decode(&wire), r#"{"system":{"get_sysinfo":{}}}"#);
//! ```

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Seed of the XOR key stream.
pub const INITIAL_KEY: u8 = 171;

/// Size of the length prefix in bytes.
pub const HEADER_LEN: usize = 4;

/// Upper bound on the payload accepted from a device.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Obfuscates a plaintext byte stream.
#[must_use]
pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    plain
        .iter()
        .map(|&b| {
            key ^= b;
            key
        })
        .collect()
}

/// Reverses [`encrypt`].
///
/// The key advances with the ciphertext byte, not the recovered plaintext.
#[must_use]
pub fn decrypt(cipher: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;
    cipher
        .iter()
        .map(|&c| {
            let plain = c ^ key;
            key = c;
            plain
        })
        .collect()
}

/// Encodes a command into a complete wire frame.
#[must_use]
pub fn encode(command: &str) -> Vec<u8> {
    let plain = command.as_bytes();
    // Commands are a few hundred bytes at most.
    #[allow(clippy::cast_possible_truncation)]
    let len = plain.len() as u32;

    let mut frame = Vec::with_capacity(HEADER_LEN + plain.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend(encrypt(plain));
    frame
}

/// Decodes a complete wire frame into text.
///
/// The length prefix is skipped without being checked against the payload.
/// A frame shorter than the prefix decodes to an empty string.
#[must_use]
pub fn decode(frame: &[u8]) -> String {
    let payload = frame.get(HEADER_LEN..).unwrap_or_default();
    String::from_utf8_lossy(&decrypt(payload)).into_owned()
}

/// Returns the payload length announced by a frame header.
#[must_use]
pub fn declared_len(header: [u8; HEADER_LEN]) -> usize {
    u32::from_be_bytes(header) as usize
}

/// Reads one response frame from a device.
///
/// Reads the header, then payload bytes until the announced length arrives
/// or the peer closes the stream. A short payload is accepted; an empty one
/// is an [`io::ErrorKind::UnexpectedEof`] error.
pub(crate) async fn read_frame<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let wanted = declared_len(header).min(MAX_PAYLOAD_LEN);

    let mut frame = Vec::with_capacity(HEADER_LEN + wanted);
    frame.extend_from_slice(&header);

    let mut buf = [0u8; 2048];
    while frame.len() - HEADER_LEN < wanted {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = wanted - (frame.len() - HEADER_LEN);
        frame.extend_from_slice(&buf[..n.min(room)]);
    }

    if frame.len() == HEADER_LEN && wanted > 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "device closed the connection before sending a payload",
        ));
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSINFO: &str = r#"{"system":{"get_sysinfo":{}}}"#;

    const SYSINFO_CIPHER: [u8; 29] = [
        0xd0, 0xf2, 0x81, 0xf8, 0x8b, 0xff, 0x9a, 0xf7, 0xd5, 0xef, 0x94, 0xb6, 0xd1, 0xb4, 0xc0,
        0x9f, 0xec, 0x95, 0xe6, 0x8f, 0xe1, 0x87, 0xe8, 0xca, 0xf0, 0x8b, 0xf6, 0x8b, 0xf6,
    ];

    #[test]
    fn encode_known_vector() {
        let wire = encode(SYSINFO);
        assert_eq!(&wire[..HEADER_LEN], &[0, 0, 0, 29]);
        assert_eq!(&wire[HEADER_LEN..], &SYSINFO_CIPHER);
    }

    #[test]
    fn decode_known_vector() {
        let mut frame = vec![0, 0, 0, 29];
        frame.extend_from_slice(&SYSINFO_CIPHER);
        assert_eq!(decode(&frame), SYSINFO);
    }

    #[test]
    fn decode_chains_on_ciphertext() {
        // "{}" -> 0xAB^0x7B = 0xD0, 0xD0^0x7D = 0xAD
        assert_eq!(encrypt(b"{}"), vec![0xd0, 0xad]);
        assert_eq!(decrypt(&[0xd0, 0xad]), b"{}".to_vec());
    }

    #[test]
    fn round_trip_preserves_text() {
        for cmd in [
            "",
            "{}",
            r#"{"system":{"set_relay_state":{"state":1}}}"#,
            r#"{"emeter":{"get_realtime":{}}}"#,
            r#"{"system":{"set_dev_alias":{"alias":"Küche"}}}"#,
        ] {
            assert_eq!(decode(&encode(cmd)), cmd);
        }
    }

    #[test]
    fn length_prefix_is_plaintext_byte_length() {
        let cmd = "x".repeat(300);
        let wire = encode(&cmd);
        assert_eq!(&wire[..HEADER_LEN], &300u32.to_be_bytes());
        assert_eq!(declared_len([0, 0, 1, 44]), 300);
    }

    #[test]
    fn independent_calls_share_no_key_state() {
        let first = encode("abc");
        let second = encode("abc");
        assert_eq!(first, second);
    }

    #[test]
    fn decode_short_frame_is_empty() {
        assert_eq!(decode(&[0, 0]), "");
    }

    #[tokio::test]
    async fn read_frame_stops_at_declared_length() {
        let mut wire = encode(SYSINFO);
        wire.extend_from_slice(b"trailing garbage");
        let mut reader = wire.as_slice();

        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(decode(&frame), SYSINFO);
    }

    #[tokio::test]
    async fn read_frame_accepts_short_payload() {
        let mut wire = encode(SYSINFO);
        wire[3] = 200;
        let mut reader = wire.as_slice();

        let frame = read_frame(&mut reader).await.unwrap();
        assert_eq!(decode(&frame), SYSINFO);
    }

    #[tokio::test]
    async fn read_frame_rejects_empty_payload() {
        let wire = [0u8, 0, 0, 10];
        let mut reader = &wire[..];

        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
