//! WAL entry encoding and decoding
//!
//! Every entry is framed with its length and a CRC32 checksum so that a torn
//! tail or a flipped bit is detected during recovery.
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: Total size of type + payload + crc (NOT including length itself)
//! - **type**: Entry type tag (1=BeginTxn, 2=Write, 3=CommitTxn, 4=AbortTxn)
//! - **payload**: bincode-serialized WALEntry
//! - **crc32**: CRC32 checksum over \[type\]\[payload\]
//!
//! All integers are little-endian.

use crate::wal::WALEntry;
use crc32fast::Hasher;
use tally_core::error::{Error, Result};

const TYPE_BEGIN_TXN: u8 = 1;
const TYPE_WRITE: u8 = 2;
const TYPE_COMMIT_TXN: u8 = 3;
const TYPE_ABORT_TXN: u8 = 4;

/// Smallest valid value of the length field: type(1) + crc(4)
const MIN_ENTRY_LEN: usize = 5;

fn type_tag(entry: &WALEntry) -> u8 {
    match entry {
        WALEntry::BeginTxn { .. } => TYPE_BEGIN_TXN,
        WALEntry::Write { .. } => TYPE_WRITE,
        WALEntry::CommitTxn { .. } => TYPE_COMMIT_TXN,
        WALEntry::AbortTxn { .. } => TYPE_ABORT_TXN,
    }
}

/// Encode WAL entry to bytes
///
/// Format: `[length: u32][type: u8][payload: bytes][crc32: u32]`
///
/// Returns byte buffer ready for file I/O.
pub fn encode_entry(entry: &WALEntry) -> Result<Vec<u8>> {
    let tag = type_tag(entry);
    let payload = bincode::serialize(entry)?;

    let total_len = 1 + payload.len() + 4;
    let total_len_u32 = u32::try_from(total_len).map_err(|_| {
        Error::InvalidOperation(format!("WAL entry too large: {} bytes", total_len))
    })?;

    let mut buf = Vec::with_capacity(4 + total_len);
    buf.extend_from_slice(&total_len_u32.to_le_bytes());
    buf.push(tag);
    buf.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&[tag]);
    hasher.update(&payload);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());

    Ok(buf)
}

/// Decode WAL entry from bytes with CRC validation
///
/// Returns the decoded entry and the number of bytes consumed.
/// `offset` is the file position of `buf[0]`, used in error reports.
///
/// # Errors
///
/// - `Error::IncompleteEntry` when the buffer ends before the entry does.
///   At the end of a file this means a partial write.
/// - `Error::Corruption` on a bad length, CRC mismatch, unknown type tag,
///   tag/payload mismatch or undecodable payload.
pub fn decode_entry(buf: &[u8], offset: u64) -> Result<(WALEntry, usize)> {
    if buf.len() < 4 {
        return Err(Error::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4,
        });
    }
    let total_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if total_len < MIN_ENTRY_LEN {
        return Err(Error::Corruption(format!(
            "offset {}: Invalid entry length {} (minimum is {} bytes: type(1) + crc(4))",
            offset, total_len, MIN_ENTRY_LEN
        )));
    }

    if buf.len() < 4 + total_len {
        return Err(Error::IncompleteEntry {
            offset,
            have: buf.len(),
            needed: 4 + total_len,
        });
    }

    let tag = buf[4];
    let payload = &buf[5..4 + total_len - 4];
    let crc_start = 4 + total_len - 4;
    let stored_crc = u32::from_le_bytes([
        buf[crc_start],
        buf[crc_start + 1],
        buf[crc_start + 2],
        buf[crc_start + 3],
    ]);

    let mut hasher = Hasher::new();
    hasher.update(&[tag]);
    hasher.update(payload);
    let computed_crc = hasher.finalize();

    if stored_crc != computed_crc {
        return Err(Error::Corruption(format!(
            "offset {}: CRC mismatch (expected {:#010x}, got {:#010x})",
            offset, stored_crc, computed_crc
        )));
    }

    if !(TYPE_BEGIN_TXN..=TYPE_ABORT_TXN).contains(&tag) {
        return Err(Error::Corruption(format!(
            "offset {}: Unknown entry type {}",
            offset, tag
        )));
    }

    let entry: WALEntry = bincode::deserialize(payload).map_err(|e| {
        Error::Corruption(format!("offset {}: Failed to deserialize entry: {}", offset, e))
    })?;

    if type_tag(&entry) != tag {
        return Err(Error::Corruption(format!(
            "offset {}: Type tag {} does not match entry {:?}",
            offset,
            tag,
            type_tag(&entry)
        )));
    }

    Ok((entry, 4 + total_len))
}
