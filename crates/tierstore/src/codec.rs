//! On-disk entry format using nom
//!
//! ```text
//! TIERENT1
//! [expires_at: u64 little-endian unix millis, 0 = never]
//! ...value bytes...
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nom::{bytes::complete::tag, number::complete::le_u64, sequence::preceded, IResult};

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Magic header for entry files
pub const ENTRY_MAGIC: &[u8] = b"TIERENT1";

/// Size of the fixed header preceding the value
pub const HEADER_LEN: usize = ENTRY_MAGIC.len() + 8;

fn header(input: &[u8]) -> IResult<&[u8], u64> {
    preceded(tag(ENTRY_MAGIC), le_u64)(input)
}

fn to_millis(at: SystemTime) -> u64 {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0);
    // 0 is reserved for "never"
    millis.max(1)
}

/// Serialize an entry
pub fn encode_entry(entry: &Entry) -> Vec<u8> {
    let expires = entry.expires_at().map(to_millis).unwrap_or(0);

    let mut buf = Vec::with_capacity(HEADER_LEN + entry.value().len());
    buf.extend_from_slice(ENTRY_MAGIC);
    buf.extend_from_slice(&expires.to_le_bytes());
    buf.extend_from_slice(entry.value());
    buf
}

/// Parse an entry
///
/// Expiry is kept at millisecond precision.
pub fn decode_entry(input: &[u8]) -> Result<Entry> {
    if input.len() < HEADER_LEN {
        return Err(Error::Parse("Input too short for entry header".to_string()));
    }

    let (value, expires) = header(input)?;
    let value = value.to_vec();

    Ok(match expires {
        0 => Entry::new(value),
        ms => Entry::with_expires_at(value, UNIX_EPOCH + Duration::from_millis(ms)),
    })
}
