//! Byte-exact encoders for every ZIP record this crate emits.
//!
//! Every function here returns a freshly built `Vec<u8>` for one record. The streamer
//! writes that buffer to its sink; the size estimator (`crate::estimator`) calls the very
//! same functions and only looks at the returned length, which is what keeps it bit-faithful
//! to what the streamer actually produces.

use crate::entry::{Entry, StorageMode};

pub const SIG_LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
pub const SIG_DATA_DESCRIPTOR: u32 = 0x0807_4b50;
pub const SIG_CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
pub const SIG_ZIP64_EOCD: u32 = 0x0606_4b50;
pub const SIG_ZIP64_EOCD_LOCATOR: u32 = 0x0706_4b50;
pub const SIG_EOCD: u32 = 0x0605_4b50;

const ZIP64_EXTRA_ID: u16 = 0x0001;
const VERSION_NEEDED_ZIP64: u16 = 45;

/// UNIX "regular file, 0644" external attributes, with the `made-by` host OS set to UNIX
/// (version_made_by high byte = 3) so desktop unarchivers preserve sane permissions.
const EXTERNAL_ATTRS_REGULAR_FILE_0644: u32 = (0o100644u32) << 16;

fn gp_flags(entry: &Entry) -> u16 {
    let mut flags = 0u16;
    if entry.use_data_descriptor {
        flags |= 1 << 3;
    }
    if entry.requires_efs_flag() {
        flags |= 1 << 11;
    }
    flags
}

/// Local file header's Zip64 extra field: present only when this entry's own sizes
/// overflow 32 bits, and always the *first* extra field when present (Explorer requires
/// this ordering).
fn local_zip64_extra(entry: &Entry) -> Vec<u8> {
    if !entry.local_requires_zip64() {
        return Vec::new();
    }
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
    data.extend_from_slice(&entry.compressed_size.to_le_bytes());

    let mut extra = Vec::with_capacity(4 + data.len());
    extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
    extra.extend_from_slice(&(data.len() as u16).to_le_bytes());
    extra.extend_from_slice(&data);
    extra
}

/// Local file header. When sizes are known up front they're written directly; when
/// `entry.use_data_descriptor` is set, CRC/sizes are zeroed and a data descriptor follows
/// the body instead.
pub fn local_file_header(entry: &Entry) -> Vec<u8> {
    let zip64_extra = local_zip64_extra(entry);
    let version_needed = if zip64_extra.is_empty() {
        entry.storage_mode.version_needed()
    } else {
        VERSION_NEEDED_ZIP64
    };

    let mut out = Vec::with_capacity(30 + entry.filename.len() + zip64_extra.len());
    out.extend_from_slice(&SIG_LOCAL_FILE_HEADER.to_le_bytes());
    out.extend_from_slice(&version_needed.to_le_bytes());
    out.extend_from_slice(&gp_flags(entry).to_le_bytes());
    out.extend_from_slice(&entry.storage_mode.method_id().to_le_bytes());
    out.extend_from_slice(&entry.mtime.time.to_le_bytes());
    out.extend_from_slice(&entry.mtime.date.to_le_bytes());

    if entry.use_data_descriptor {
        out.extend_from_slice(&0u32.to_le_bytes()); // crc32 placeholder
        out.extend_from_slice(&0u32.to_le_bytes()); // compressed size placeholder
        out.extend_from_slice(&0u32.to_le_bytes()); // uncompressed size placeholder
    } else {
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        if zip64_extra.is_empty() {
            out.extend_from_slice(&(entry.compressed_size as u32).to_le_bytes());
            out.extend_from_slice(&(entry.uncompressed_size as u32).to_le_bytes());
        } else {
            // Real sizes live in the Zip64 extra field; the 32-bit slots carry placeholders.
            out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
            out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        }
    }

    out.extend_from_slice(&(entry.filename.len() as u16).to_le_bytes());
    out.extend_from_slice(&(zip64_extra.len() as u16).to_le_bytes());
    out.extend_from_slice(entry.filename.as_bytes());
    out.extend_from_slice(&zip64_extra);
    out
}

/// Data descriptor following an entry body, used whenever sizes/CRC weren't known at
/// local-header time. Uses 64-bit size fields iff either size overflows 32 bits.
pub fn data_descriptor(crc32: u32, compressed_size: u64, uncompressed_size: u64) -> Vec<u8> {
    let wide = compressed_size > u32::MAX as u64 || uncompressed_size > u32::MAX as u64;
    let mut out = Vec::with_capacity(if wide { 24 } else { 16 });
    out.extend_from_slice(&SIG_DATA_DESCRIPTOR.to_le_bytes());
    out.extend_from_slice(&crc32.to_le_bytes());
    if wide {
        out.extend_from_slice(&compressed_size.to_le_bytes());
        out.extend_from_slice(&uncompressed_size.to_le_bytes());
    } else {
        out.extend_from_slice(&(compressed_size as u32).to_le_bytes());
        out.extend_from_slice(&(uncompressed_size as u32).to_le_bytes());
    }
    out
}

/// Central-directory Zip64 extra field: only the overflowing fields are present, in the
/// canonical order (uncompressed size, compressed size, local header offset), matching the
/// positions of the 0xFFFFFFFF placeholders left in the fixed-size part of the record.
fn central_zip64_extra(entry: &Entry) -> Vec<u8> {
    if !entry.central_requires_zip64() {
        return Vec::new();
    }
    let mut data = Vec::with_capacity(24);
    if entry.uncompressed_size > u32::MAX as u64 {
        data.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
    }
    if entry.compressed_size > u32::MAX as u64 {
        data.extend_from_slice(&entry.compressed_size.to_le_bytes());
    }
    if entry.local_header_offset > u32::MAX as u64 {
        data.extend_from_slice(&entry.local_header_offset.to_le_bytes());
    }

    let mut extra = Vec::with_capacity(4 + data.len());
    extra.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
    extra.extend_from_slice(&(data.len() as u16).to_le_bytes());
    extra.extend_from_slice(&data);
    extra
}

/// Central-directory file header for one entry.
pub fn central_directory_header(entry: &Entry) -> Vec<u8> {
    let zip64_extra = central_zip64_extra(entry);
    let version_needed = if zip64_extra.is_empty() {
        entry.storage_mode.version_needed()
    } else {
        VERSION_NEEDED_ZIP64
    };
    // version_made_by: high byte 3 (UNIX host), low byte mirrors version_needed.
    let version_made_by = (3u16 << 8) | (version_needed & 0x00ff);

    let mut out = Vec::with_capacity(46 + entry.filename.len() + zip64_extra.len());
    out.extend_from_slice(&SIG_CENTRAL_DIRECTORY.to_le_bytes());
    out.extend_from_slice(&version_made_by.to_le_bytes());
    out.extend_from_slice(&version_needed.to_le_bytes());
    out.extend_from_slice(&gp_flags(entry).to_le_bytes());
    out.extend_from_slice(&entry.storage_mode.method_id().to_le_bytes());
    out.extend_from_slice(&entry.mtime.time.to_le_bytes());
    out.extend_from_slice(&entry.mtime.date.to_le_bytes());
    out.extend_from_slice(&entry.crc32.to_le_bytes());

    if entry.compressed_size > u32::MAX as u64 {
        out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    } else {
        out.extend_from_slice(&(entry.compressed_size as u32).to_le_bytes());
    }
    if entry.uncompressed_size > u32::MAX as u64 {
        out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    } else {
        out.extend_from_slice(&(entry.uncompressed_size as u32).to_le_bytes());
    }

    out.extend_from_slice(&(entry.filename.len() as u16).to_le_bytes());
    out.extend_from_slice(&(zip64_extra.len() as u16).to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // file comment length
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number start
    out.extend_from_slice(&0u16.to_le_bytes()); // internal file attributes
    out.extend_from_slice(&EXTERNAL_ATTRS_REGULAR_FILE_0644.to_le_bytes());

    if entry.local_header_offset > u32::MAX as u64 {
        out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    } else {
        out.extend_from_slice(&(entry.local_header_offset as u32).to_le_bytes());
    }

    out.extend_from_slice(entry.filename.as_bytes());
    out.extend_from_slice(&zip64_extra);
    out
}

/// Zip64 end-of-central-directory record, version needed 45 throughout.
pub fn zip64_eocd(entry_count: u64, central_dir_size: u64, central_dir_offset: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(56);
    out.extend_from_slice(&SIG_ZIP64_EOCD.to_le_bytes());
    // Size of the remaining record fields (fixed at 44: everything after this u64 itself).
    out.extend_from_slice(&44u64.to_le_bytes());
    out.extend_from_slice(&VERSION_NEEDED_ZIP64.to_le_bytes()); // version made by
    out.extend_from_slice(&VERSION_NEEDED_ZIP64.to_le_bytes()); // version needed
    out.extend_from_slice(&0u32.to_le_bytes()); // number of this disk
    out.extend_from_slice(&0u32.to_le_bytes()); // disk with the start of the central directory
    out.extend_from_slice(&entry_count.to_le_bytes()); // entries on this disk
    out.extend_from_slice(&entry_count.to_le_bytes()); // total entries
    out.extend_from_slice(&central_dir_size.to_le_bytes());
    out.extend_from_slice(&central_dir_offset.to_le_bytes());
    out
}

/// Zip64 end-of-central-directory locator, pointing at the Zip64 EOCD record above.
pub fn zip64_eocd_locator(zip64_eocd_offset: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(20);
    out.extend_from_slice(&SIG_ZIP64_EOCD_LOCATOR.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // disk with the Zip64 EOCD record
    out.extend_from_slice(&zip64_eocd_offset.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // total number of disks
    out
}

/// Classic end-of-central-directory record, with 0xFFFF/0xFFFFFFFF placeholders wherever a
/// field overflows (the real values live in the Zip64 EOCD record written just before it).
pub fn eocd(entry_count: u64, central_dir_size: u64, central_dir_offset: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(22);
    out.extend_from_slice(&SIG_EOCD.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // number of this disk
    out.extend_from_slice(&0u16.to_le_bytes()); // disk with the start of the central directory

    if entry_count > u16::MAX as u64 {
        out.extend_from_slice(&0xFFFFu16.to_le_bytes());
        out.extend_from_slice(&0xFFFFu16.to_le_bytes());
    } else {
        out.extend_from_slice(&(entry_count as u16).to_le_bytes());
        out.extend_from_slice(&(entry_count as u16).to_le_bytes());
    }

    if central_dir_size >= u32::MAX as u64 {
        out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    } else {
        out.extend_from_slice(&(central_dir_size as u32).to_le_bytes());
    }
    if central_dir_offset >= u32::MAX as u64 {
        out.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    } else {
        out.extend_from_slice(&(central_dir_offset as u32).to_le_bytes());
    }

    out.extend_from_slice(&0u16.to_le_bytes()); // comment length
    out
}

/// Whether the archive as a whole must upgrade to Zip64 EOCD + locator, per §4.4: any of
/// entry count overflow, central directory offset/size overflow, or any entry's central
/// record itself needed Zip64.
pub fn archive_requires_zip64(entries: &[Entry], central_dir_size: u64, central_dir_offset: u64) -> bool {
    entries.len() > 65_534
        || central_dir_offset >= u32::MAX as u64
        || central_dir_size >= u32::MAX as u64
        || entries.iter().any(Entry::central_requires_zip64)
}
