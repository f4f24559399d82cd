//! Mapped byte regions
//!
//! The codec never touches raw pointers: every access goes through these
//! bounds-checked accessors, so a bad length field surfaces as
//! `CorruptFormat` (reads) or `CapacityExceeded` (writes).

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use memmap2::{Mmap, MmapMut};

use crate::error::{Result, StrataError};

// =============================================================================
// Read Region
// =============================================================================

/// Read-only view of one mapped file
///
/// Cloning is cheap: every clone shares the same mapping, which is released
/// when the last clone is dropped. Zero-length files carry no mapping.
#[derive(Debug, Clone, Default)]
pub struct ReadRegion {
    map: Option<Arc<Mmap>>,
}

impl ReadRegion {
    /// Map `path` read-only
    ///
    /// The file handle is closed as soon as the mapping exists.
    pub fn map(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(Self::default());
        }

        // SAFETY: generations are never modified after being written; the
        // only later file operation is deletion, which does not invalidate
        // an existing mapping on unix.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self {
            map: Some(Arc::new(map)),
        })
    }

    /// Wrap an in-memory buffer; used by tests and tools.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let mut anon = MmapMut::map_anon(bytes.len())?;
        anon.copy_from_slice(bytes);
        Ok(Self {
            map: Some(Arc::new(anon.make_read_only()?)),
        })
    }

    pub fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.map {
            Some(map) => &map[..],
            None => &[],
        }
    }

    /// `len` bytes starting at `offset`
    pub fn slice(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| StrataError::corrupt(offset, "length overflows u64"))?;
        if end > self.len() {
            return Err(StrataError::corrupt(
                offset,
                format!("read of {} bytes past region end {}", len, self.len()),
            ));
        }
        Ok(&self.as_slice()[offset as usize..end as usize])
    }

    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_word(offset)?))
    }

    pub fn read_i64(&self, offset: u64) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_word(offset)?))
    }

    fn read_word(&self, offset: u64) -> Result<[u8; 8]> {
        let mut word = [0u8; 8];
        word.copy_from_slice(self.slice(offset, 8)?);
        Ok(word)
    }
}

// =============================================================================
// Write Region
// =============================================================================

/// Exclusively owned, fixed-size write mapping of a new file
///
/// Lives for a single flush or compaction. Dropping it without `finish`
/// (e.g. on an error path) still unmaps; the partial file is left in place.
pub struct WriteRegion {
    file: File,
    map: Option<MmapMut>,
    capacity: u64,
}

impl WriteRegion {
    /// Create (or truncate) `path` and map exactly `capacity` bytes of it
    pub fn create(path: &Path, capacity: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(capacity)?;

        let map = if capacity == 0 {
            None
        } else {
            // SAFETY: the file was just created by us and is not shared with
            // any reader until this region is finished.
            Some(unsafe { MmapMut::map_mut(&file)? })
        };

        Ok(Self {
            file,
            map,
            capacity,
        })
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Copy `bytes` to `offset`, returning the offset just past them
    pub fn write_bytes(&mut self, offset: u64, bytes: &[u8]) -> Result<u64> {
        let end = offset + bytes.len() as u64;
        if end > self.capacity {
            return Err(StrataError::CapacityExceeded {
                needed: end,
                capacity: self.capacity,
            });
        }
        if let Some(map) = self.map.as_mut() {
            map[offset as usize..end as usize].copy_from_slice(bytes);
        }
        Ok(end)
    }

    pub fn write_u64(&mut self, offset: u64, value: u64) -> Result<u64> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    pub fn write_i64(&mut self, offset: u64, value: i64) -> Result<u64> {
        self.write_bytes(offset, &value.to_le_bytes())
    }

    /// Flush the mapping, unmap, and cut the file down to `written` bytes
    ///
    /// The mapping is released before truncation so nothing can touch the
    /// pages being cut off.
    pub fn finish(mut self, written: u64) -> Result<()> {
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        if written != self.capacity {
            self.file.set_len(written)?;
        }
        self.file.sync_all()?;
        Ok(())
    }
}
