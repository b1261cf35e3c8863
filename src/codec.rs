//! Codec layer (component D): per-block payload compression.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression as DeflateLevel;

use crate::error::{Error, Result};
use crate::field::Compression;

/// Decodes `payload` (as recorded in a block header) into a buffer of
/// exactly `uncompressed_len` bytes.
///
/// `Compression::None` requires `payload.len() == uncompressed_len` and
/// returns it unchanged. `Compression::Zip` inflates a raw DEFLATE stream
/// and fails with [`Error::InvalidCompression`] if the result isn't exactly
/// `uncompressed_len` bytes. Any other recognized tag is rejected with
/// [`Error::CompressionUnsupported`].
pub fn decode(compression: Compression, payload: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    match compression {
        Compression::None => {
            if payload.len() != uncompressed_len {
                return Err(Error::InvalidCompression);
            }
            Ok(payload.to_vec())
        }
        Compression::Zip => {
            let mut decoder = DeflateDecoder::new(payload);
            let mut out = Vec::with_capacity(uncompressed_len);
            decoder.read_to_end(&mut out).map_err(|_| Error::InvalidCompression)?;
            if out.len() != uncompressed_len {
                return Err(Error::InvalidCompression);
            }
            Ok(out)
        }
        other => Err(Error::CompressionUnsupported(other)),
    }
}

/// Encodes `data` under `compression`. The write engine only ever calls
/// this with `Compression::None`, but the function is complete so a future
/// caller can opt into `Zip`.
pub fn encode(compression: Compression, data: &[u8]) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Zip => {
            let mut encoder = DeflateEncoder::new(Vec::new(), DeflateLevel::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        other => Err(Error::CompressionUnsupported(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_passthrough() {
        let data = b"abcdefgh".to_vec();
        let encoded = encode(Compression::None, &data).unwrap();
        assert_eq!(encoded, data);
        let decoded = decode(Compression::None, &encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn none_wrong_length_is_invalid() {
        assert!(decode(Compression::None, b"abc", 4).is_err());
    }

    #[test]
    fn zip_roundtrip() {
        let data: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        let encoded = encode(Compression::Zip, &data).unwrap();
        assert!(encoded.len() < data.len());
        let decoded = decode(Compression::Zip, &encoded, data.len()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn zip_wrong_length_is_invalid() {
        let data = vec![7u8; 100];
        let encoded = encode(Compression::Zip, &data).unwrap();
        assert!(decode(Compression::Zip, &encoded, 50).is_err());
    }

    #[test]
    fn unsupported_codec_is_rejected() {
        assert!(matches!(
            decode(Compression::Jpg, &[], 0),
            Err(Error::CompressionUnsupported(Compression::Jpg))
        ));
    }
}
