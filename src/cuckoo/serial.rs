//! Bit-exact big-endian wire format for a [`crate::CuckooFilter`].
//!
//! ```text
//! strategyOrdinal   1 signed byte
//! capacity          8 bytes
//! fpp               8 bytes (IEEE-754 binary64)
//! size              8 bytes
//! checksum          8 bytes
//! numBuckets        8 bytes
//! entriesPerBucket  4 bytes
//! bitsPerEntry      4 bytes
//! dataLen           4 bytes         count of 64-bit words to follow
//! data[0..dataLen)  8 bytes each    raw table words
//! ```

use crate::cuckoo::indexing::STRATEGY_ORDINAL;
use crate::cuckoo::table::BitPackedTable;
use crate::FilterError;

pub(crate) fn encode(
    capacity: u64,
    fpp: f64,
    table: &BitPackedTable,
) -> Vec<u8> {
    let words = table.words();
    let mut out = Vec::with_capacity(1 + 8 * 5 + 4 * 3 + words.len() * 8);

    out.push(STRATEGY_ORDINAL as u8);
    out.extend_from_slice(&capacity.to_be_bytes());
    out.extend_from_slice(&fpp.to_be_bytes());
    out.extend_from_slice(&table.size().to_be_bytes());
    out.extend_from_slice(&table.checksum().to_be_bytes());
    out.extend_from_slice(&table.num_buckets().to_be_bytes());
    out.extend_from_slice(&u32::from(table.entries_per_bucket()).to_be_bytes());
    out.extend_from_slice(&u32::from(table.bits_per_entry()).to_be_bytes());
    out.extend_from_slice(&(words.len() as u32).to_be_bytes());
    for word in words {
        out.extend_from_slice(&word.to_be_bytes());
    }

    out
}

pub(crate) struct Decoded {
    pub(crate) capacity: u64,
    pub(crate) fpp: f64,
    pub(crate) table: BitPackedTable,
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Decoded, FilterError> {
    let mut cursor = Cursor::new(bytes);

    let ordinal = cursor.read_i8()?;
    if ordinal != STRATEGY_ORDINAL {
        return Err(FilterError::Deserialization(format!(
            "unknown strategy ordinal {ordinal}"
        )));
    }

    let capacity = cursor.read_u64()?;
    let fpp = cursor.read_f64()?;
    let size = cursor.read_u64()?;
    let checksum = cursor.read_u64()?;
    let num_buckets = cursor.read_u64()?;
    let entries_per_bucket = cursor.read_u32()?;
    let bits_per_entry = cursor.read_u32()?;
    let data_len = cursor.read_u32()? as usize;

    if ![2u32, 4, 8].contains(&entries_per_bucket) {
        return Err(FilterError::Deserialization(format!(
            "invalid entries per bucket {entries_per_bucket}"
        )));
    }
    if bits_per_entry == 0 || bits_per_entry > 32 {
        return Err(FilterError::Deserialization(format!(
            "invalid bits per entry {bits_per_entry}"
        )));
    }

    let mut words = Vec::with_capacity(data_len);
    for _ in 0..data_len {
        words.push(cursor.read_u64()?);
    }
    if !cursor.is_exhausted() {
        return Err(FilterError::Deserialization(
            "trailing bytes after declared data length".to_string(),
        ));
    }

    let table = BitPackedTable::from_parts(
        words.into_boxed_slice(),
        num_buckets,
        entries_per_bucket as u8,
        bits_per_entry as u8,
        size,
        checksum,
    );

    Ok(Decoded { capacity, fpp, table })
}

/// A minimal big-endian byte cursor over a borrowed slice, used only by
/// [`decode`]. Every read reports truncation as a [`FilterError::Deserialization`].
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FilterError> {
        let end = self.pos + n;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| FilterError::Deserialization("unexpected end of stream".to_string()))?;
        self.pos = end;
        Ok(slice)
    }

    fn read_i8(&mut self) -> Result<i8, FilterError> {
        Ok(self.take(1)?[0] as i8)
    }

    fn read_u32(&mut self) -> Result<u32, FilterError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64, FilterError> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_f64(&mut self) -> Result<f64, FilterError> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
