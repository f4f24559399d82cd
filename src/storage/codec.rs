//! Table Codec
//!
//! Pure encode/decode functions over mapped regions. A generation is two
//! files; see the module docs of [`crate::storage`] for the layout.

use bytes::Bytes;

use crate::entry::Entry;
use crate::error::{Result, StrataError};

use super::region::{ReadRegion, WriteRegion};

// =============================================================================
// Format Constants
// =============================================================================

/// Width of the key-length field
pub const KEY_LEN_SIZE: u64 = 8;

/// Width of the value-length-or-tombstone field
pub const VALUE_LEN_SIZE: u64 = 8;

/// Fixed bytes every record carries besides key and value
pub const RECORD_HEADER_SIZE: u64 = KEY_LEN_SIZE + VALUE_LEN_SIZE;

/// Width of one offsets-file slot
pub const OFFSET_SIZE: u64 = 8;

/// Value-length sentinel marking a tombstone (no value bytes follow)
pub const TOMBSTONE_LEN: i64 = -1;

// =============================================================================
// Sizing
// =============================================================================

/// Exact byte sizes of a generation, measured before any write begins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSize {
    pub entry_count: u64,
    pub values_bytes: u64,
    pub offsets_bytes: u64,
}

impl TableSize {
    /// Measure a full pass over `entries`
    ///
    /// values = 2*8*count + sum(key lengths) + sum(value lengths of live entries);
    /// offsets = 8*count.
    pub fn measure<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut entry_count = 0u64;
        let mut payload = 0u64;
        for entry in entries {
            entry_count += 1;
            payload += entry.payload_len();
        }
        Self::from_totals(entry_count, payload)
    }

    /// Sizes for `entry_count` records carrying `payload` key+value bytes
    pub fn from_totals(entry_count: u64, payload: u64) -> Self {
        Self {
            entry_count,
            values_bytes: RECORD_HEADER_SIZE * entry_count + payload,
            offsets_bytes: OFFSET_SIZE * entry_count,
        }
    }
}

/// Encoded size of one record
pub fn record_size(entry: &Entry) -> u64 {
    RECORD_HEADER_SIZE + entry.payload_len()
}

// =============================================================================
// Decoding
// =============================================================================

/// Number of records indexed by an offsets region
pub fn entry_count(offsets: &ReadRegion) -> u64 {
    offsets.len() / OFFSET_SIZE
}

/// Byte offset of record `index` within the values file
pub fn read_offset(offsets: &ReadRegion, index: u64) -> Result<u64> {
    offsets.read_u64(index * OFFSET_SIZE)
}

/// Borrow only the key of the record at `offset`, without touching its value
pub fn decode_key(values: &ReadRegion, offset: u64) -> Result<&[u8]> {
    let key_len = values.read_u64(offset)?;
    values.slice(offset + KEY_LEN_SIZE, key_len)
}

/// Decode the full record at `offset`
pub fn decode_record(values: &ReadRegion, offset: u64) -> Result<Entry> {
    let key = decode_key(values, offset)?;
    let value_len_at = offset + KEY_LEN_SIZE + key.len() as u64;
    let key = Bytes::copy_from_slice(key);

    let value_len = values.read_i64(value_len_at)?;
    let value = match value_len {
        TOMBSTONE_LEN => None,
        len if len < 0 => {
            return Err(StrataError::corrupt(
                value_len_at,
                format!("negative value length {}", len),
            ));
        }
        len => {
            let raw = values.slice(value_len_at + VALUE_LEN_SIZE, len as u64)?;
            Some(Bytes::copy_from_slice(raw))
        }
    };

    Ok(Entry { key, value })
}

// =============================================================================
// Encoding
// =============================================================================

/// Write one record at `write_offset`, returning the next write cursor
///
/// Layout: `[key len u64][key][value len i64 | -1][value]`.
pub fn encode_record(entry: &Entry, values: &mut WriteRegion, write_offset: u64) -> Result<u64> {
    let mut cursor = values.write_u64(write_offset, entry.key.len() as u64)?;
    cursor = values.write_bytes(cursor, &entry.key)?;
    match &entry.value {
        Some(value) => {
            cursor = values.write_i64(cursor, value.len() as i64)?;
            cursor = values.write_bytes(cursor, value)?;
        }
        None => {
            cursor = values.write_i64(cursor, TOMBSTONE_LEN)?;
        }
    }
    Ok(cursor)
}

/// Append one record offset at `write_cursor`; always returns `write_cursor + 8`
pub fn write_offset_entry(value_offset: u64, offsets: &mut WriteRegion, write_cursor: u64) -> Result<u64> {
    offsets.write_u64(write_cursor, value_offset)
}
