//! SGA start header structure, parsing, and encoding.

use crate::{Error, Result};
use std::io::{Read, Write};

use super::reader::{read_u8, read_u32_le, write_u32_le, write_u64_le};
use super::{SIGNATURE, START_HEADER_SIZE, VERSION_MAJOR, VERSION_MINOR};

/// The start header of an SGA archive.
///
/// This is the fixed 32-byte structure at the beginning of every SGA file.
/// The node table begins immediately after it, followed by the data segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartHeader {
    /// Archive format version - major number.
    pub version_major: u8,
    /// Archive format version - minor number.
    pub version_minor: u8,
    /// CRC of the following 20 bytes (tree size, data size, tree CRC).
    pub start_header_crc: u32,
    /// Byte length of the node table.
    pub tree_size: u64,
    /// Byte length of the data segment.
    pub data_size: u64,
    /// CRC of the node table bytes.
    pub tree_crc: u32,
}

impl StartHeader {
    /// Parses the signature and start header from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The signature is invalid
    /// - The version is unsupported
    /// - The start header CRC doesn't match
    /// - An I/O error occurs
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        // Read and validate signature
        let mut sig = [0u8; 6];
        r.read_exact(&mut sig).map_err(Error::from)?;
        if sig != *SIGNATURE {
            return Err(Error::InvalidFormat("invalid SGA signature".into()));
        }

        // Read version
        let version_major = read_u8(r)?;
        let version_minor = read_u8(r)?;

        // Only 1.x up to the build's minor is readable; a higher minor may
        // carry record layouts this parser does not understand.
        if version_major != VERSION_MAJOR || version_minor > VERSION_MINOR {
            return Err(Error::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        // Read start header CRC
        let start_header_crc = read_u32_le(r)?;

        // Read the section descriptor (20 bytes that should be CRC'd)
        let mut descriptor = [0u8; 20];
        r.read_exact(&mut descriptor).map_err(Error::from)?;

        // Verify CRC
        let calculated_crc = crc32fast::hash(&descriptor);
        if calculated_crc != start_header_crc {
            return Err(Error::CorruptHeader {
                offset: 8,
                reason: format!(
                    "start header CRC mismatch: expected {:#x}, got {:#x}",
                    start_header_crc, calculated_crc
                ),
            });
        }

        // Parse the descriptor fields
        let tree_size = u64::from_le_bytes(descriptor[0..8].try_into().unwrap());
        let data_size = u64::from_le_bytes(descriptor[8..16].try_into().unwrap());
        let tree_crc = u32::from_le_bytes(descriptor[16..20].try_into().unwrap());

        Ok(Self {
            version_major,
            version_minor,
            start_header_crc,
            tree_size,
            data_size,
            tree_crc,
        })
    }

    /// Builds a start header for the given section sizes, computing both CRCs.
    pub fn for_sections(tree: &[u8], data_size: u64) -> Self {
        let tree_size = tree.len() as u64;
        let tree_crc = crc32fast::hash(tree);
        let mut descriptor = [0u8; 20];
        descriptor[0..8].copy_from_slice(&tree_size.to_le_bytes());
        descriptor[8..16].copy_from_slice(&data_size.to_le_bytes());
        descriptor[16..20].copy_from_slice(&tree_crc.to_le_bytes());
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            start_header_crc: crc32fast::hash(&descriptor),
            tree_size,
            data_size,
            tree_crc,
        }
    }

    /// Writes the full 32-byte start header.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(SIGNATURE).map_err(Error::from)?;
        w.write_all(&[self.version_major, self.version_minor])
            .map_err(Error::from)?;
        write_u32_le(w, self.start_header_crc)?;
        write_u64_le(w, self.tree_size)?;
        write_u64_le(w, self.data_size)?;
        write_u32_le(w, self.tree_crc)?;
        Ok(())
    }

    /// Returns the byte position where the node table starts.
    pub fn tree_position(&self) -> u64 {
        START_HEADER_SIZE
    }

    /// Returns the byte position where the data segment starts.
    pub fn data_position(&self) -> u64 {
        START_HEADER_SIZE + self.tree_size
    }

    /// Returns the total file size this header describes.
    ///
    /// `None` when the declared sizes overflow; such a header cannot
    /// describe any real file.
    pub fn expected_file_size(&self) -> Option<u64> {
        START_HEADER_SIZE
            .checked_add(self.tree_size)?
            .checked_add(self.data_size)
    }
}
