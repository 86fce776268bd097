//! In-memory Zip32 reader for `.osz` archives.
//!
//! # Invariants
//! - All sizes/offsets are untrusted and validated against the buffer length.
//! - Only the central directory is parsed up front; payloads are located and
//!   inflated on demand.
//!
//! # Supported
//! - Zip32 (EOCD + central directory), single disk.
//! - Entries: stored (method 0) and deflate (method 8).
//!
//! # Not Supported
//! - Zip64 (sentinel 0xFFFF/0xFFFFFFFF fields), encrypted entries. Both are
//!   reported as corruption since an `.osz` never uses them.

use crate::error::{LoadError, Result};
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;

const SIG_EOCD: u32 = 0x0605_4b50;
const SIG_CDFH: u32 = 0x0201_4b50;
const SIG_LFH: u32 = 0x0403_4b50;

const EOCD_LEN: usize = 22;
const MAX_COMMENT_LEN: usize = u16::MAX as usize;
/// Central directory fixed header length.
const CDFH_LEN: usize = 46;
/// Local file header fixed length.
const LFH_LEN: usize = 30;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATE: u16 = 8;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// Up-front reservation for inflated output is bounded by this multiple of
/// the compressed size and by [`MAX_INITIAL_RESERVE`]; the declared size is
/// untrusted and the buffer grows past the bound if the data really is larger.
const RESERVE_RATIO: u64 = 8;
const MAX_INITIAL_RESERVE: u64 = 16 * 1024 * 1024;

/// Central-directory metadata for a single file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Path inside the archive, exactly as stored.
    pub name: String,
    pub flags: u16,
    pub method: u16,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub local_header_offset: u64,
}

impl EntryMeta {
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        (self.flags & FLAG_ENCRYPTED) != 0
    }

    #[inline]
    pub fn compression_supported(&self) -> bool {
        self.method == METHOD_STORED || self.method == METHOD_DEFLATE
    }
}

fn corrupt(msg: impl Into<String>) -> LoadError {
    LoadError::ArchiveCorrupt(msg.into())
}

fn slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| corrupt(format!("read of {} bytes at {} is out of bounds", len, offset)))
}

fn u16_at(buf: &[u8], offset: usize) -> Result<u16> {
    let b = slice(buf, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

fn u32_at(buf: &[u8], offset: usize) -> Result<u32> {
    let b = slice(buf, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Locates the end-of-central-directory record, scanning back over a
/// trailing comment of up to 64 KiB.
fn find_eocd(buf: &[u8]) -> Result<usize> {
    if buf.len() < EOCD_LEN {
        return Err(corrupt("archive is smaller than an end-of-directory record"));
    }
    let last = buf.len() - EOCD_LEN;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    (first..=last)
        .rev()
        .find(|&pos| {
            u32_at(buf, pos).is_ok_and(|sig| sig == SIG_EOCD)
                && u16_at(buf, pos + 20)
                    .is_ok_and(|comment| pos + EOCD_LEN + comment as usize == buf.len())
        })
        .ok_or_else(|| corrupt("end of central directory not found"))
}

/// Parses the central directory. Directory entries are skipped.
pub fn read_central_directory(buf: &[u8]) -> Result<Vec<EntryMeta>> {
    let eocd = find_eocd(buf)?;

    let disk = u16_at(buf, eocd + 4)?;
    let cd_disk = u16_at(buf, eocd + 6)?;
    let entries_on_disk = u16_at(buf, eocd + 8)?;
    let entries_total = u16_at(buf, eocd + 10)?;
    let cd_size = u32_at(buf, eocd + 12)?;
    let cd_offset = u32_at(buf, eocd + 16)?;

    if disk != 0 || cd_disk != 0 || entries_on_disk != entries_total {
        return Err(corrupt("multi-disk archives are not supported"));
    }
    if entries_total == u16::MAX || cd_size == u32::MAX || cd_offset == u32::MAX {
        return Err(corrupt("zip64 archives are not supported"));
    }

    let cd_start = cd_offset as usize;
    let cd_end = cd_start
        .checked_add(cd_size as usize)
        .filter(|end| *end <= eocd)
        .ok_or_else(|| corrupt("central directory overlaps the end record"))?;

    let mut entries = Vec::with_capacity(entries_total as usize);
    let mut pos = cd_start;
    for _ in 0..entries_total {
        if pos + CDFH_LEN > cd_end {
            return Err(corrupt("central directory is truncated"));
        }
        if u32_at(buf, pos)? != SIG_CDFH {
            return Err(corrupt(format!("bad central directory signature at {}", pos)));
        }
        let flags = u16_at(buf, pos + 8)?;
        let method = u16_at(buf, pos + 10)?;
        let crc32 = u32_at(buf, pos + 16)?;
        let compressed_size = u32_at(buf, pos + 20)?;
        let uncompressed_size = u32_at(buf, pos + 24)?;
        let name_len = u16_at(buf, pos + 28)? as usize;
        let extra_len = u16_at(buf, pos + 30)? as usize;
        let comment_len = u16_at(buf, pos + 32)? as usize;
        let local_header_offset = u32_at(buf, pos + 42)?;

        if compressed_size == u32::MAX
            || uncompressed_size == u32::MAX
            || local_header_offset == u32::MAX
        {
            return Err(corrupt("zip64 entries are not supported"));
        }

        let name_bytes = slice(buf, pos + CDFH_LEN, name_len)?;
        let name = String::from_utf8_lossy(name_bytes).into_owned();

        pos += CDFH_LEN + name_len + extra_len + comment_len;
        if pos > cd_end {
            return Err(corrupt("central directory entry runs past its end"));
        }

        if name.ends_with('/') {
            continue;
        }

        entries.push(EntryMeta {
            name,
            flags,
            method,
            crc32,
            compressed_size: compressed_size as u64,
            uncompressed_size: uncompressed_size as u64,
            local_header_offset: local_header_offset as u64,
        });
    }

    Ok(entries)
}

fn initial_reserve(entry: &EntryMeta) -> usize {
    entry
        .uncompressed_size
        .min(entry.compressed_size.saturating_mul(RESERVE_RATIO))
        .min(MAX_INITIAL_RESERVE) as usize
}

/// Reads and decompresses one entry, verifying its size and CRC.
pub fn read_entry(buf: &[u8], entry: &EntryMeta) -> Result<Vec<u8>> {
    if entry.is_encrypted() {
        return Err(corrupt(format!("{} is encrypted", entry.name)));
    }
    if !entry.compression_supported() {
        return Err(corrupt(format!(
            "{} uses unsupported compression method {}",
            entry.name, entry.method
        )));
    }

    let lfh = entry.local_header_offset as usize;
    if u32_at(buf, lfh)? != SIG_LFH {
        return Err(corrupt(format!("bad local header signature for {}", entry.name)));
    }
    let name_len = u16_at(buf, lfh + 26)? as usize;
    let extra_len = u16_at(buf, lfh + 28)? as usize;
    let data_start = lfh + LFH_LEN + name_len + extra_len;
    let payload = slice(buf, data_start, entry.compressed_size as usize)?;

    let data = match entry.method {
        METHOD_STORED => payload.to_vec(),
        _ => {
            let mut out = Vec::with_capacity(initial_reserve(entry));
            DeflateDecoder::new(payload)
                .take(entry.uncompressed_size + 1)
                .read_to_end(&mut out)
                .map_err(|e| corrupt(format!("{}: {}", entry.name, e)))?;
            out
        }
    };

    if data.len() as u64 != entry.uncompressed_size {
        return Err(corrupt(format!(
            "{} inflated to {} bytes, expected {}",
            entry.name,
            data.len(),
            entry.uncompressed_size
        )));
    }
    let mut crc = Crc::new();
    crc.update(&data);
    if crc.sum() != entry.crc32 {
        return Err(corrupt(format!("{} failed its CRC check", entry.name)));
    }

    Ok(data)
}
