use packed_struct::prelude::*;

use crate::catalog::{Container, ContainerError, ResourceCatalog};
use crate::fork;
use crate::stream::Streamer;

// AppleSingle and AppleDouble share the entry layout; the byte-swapped
// "CIGAM" forms are accepted because `applesingle encode` on i386 OS X
// wrote its headers little-endian.
const APPLE_SINGLE_MAGIC: u32 = 0x0005_1600;
const APPLE_SINGLE_CIGAM: u32 = 0x0016_0500;
const APPLE_DOUBLE_MAGIC: u32 = 0x0005_1607;
const APPLE_DOUBLE_CIGAM: u32 = 0x0716_0500;

const VERSION_2: u32 = 0x0002_0000;
const RESOURCE_FORK_ID: u32 = 2;

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct AppleSingleHeader {
    pub magic: u32,
    pub version: u32,
    pub filler: [u8; 16],
    pub entry_count: u16,
}

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct EntryDescriptor {
    pub id: u32,
    pub offset: u32,
    pub length: u32,
}

/// Backend for AppleSingle/AppleDouble containers: the entry flagged as the
/// resource fork is located and handed to the raw fork parser.
pub struct AppleSingle;

impl Container for AppleSingle {
    fn load(&self, bytes: Vec<u8>) -> Result<ResourceCatalog, ContainerError> {
        let (offset, length) = locate_resource_fork(&bytes)?;
        let types = fork::parse_fork(&bytes, offset, length)?;
        Ok(ResourceCatalog::new(bytes, types))
    }
}

/// Magic-number sniff used when a container's encoding has to be guessed.
pub(crate) fn is_apple_single(bytes: &[u8]) -> bool {
    if bytes.len() < 4 {
        return false;
    }
    let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    matches!(magic,
        APPLE_SINGLE_MAGIC | APPLE_SINGLE_CIGAM | APPLE_DOUBLE_MAGIC | APPLE_DOUBLE_CIGAM)
}

fn locate_resource_fork(bytes: &[u8]) -> Result<(usize, usize), ContainerError> {
    let mut stream = Streamer::new(bytes);
    let mut header = AppleSingleHeader::unpack_from_slice(stream.get_bytes(26)?).unwrap();
    let little_endian = match header.magic {
        APPLE_SINGLE_MAGIC | APPLE_DOUBLE_MAGIC => false,
        APPLE_SINGLE_CIGAM | APPLE_DOUBLE_CIGAM => true,
        other => return Err(ContainerError::BadMagic(other)),
    };
    if little_endian {
        header.version = header.version.swap_bytes();
        header.entry_count = header.entry_count.swap_bytes();
    }
    if header.version != VERSION_2 {
        return Err(ContainerError::UnsupportedVersion(header.version));
    }

    for _ in 0..header.entry_count {
        let mut entry = EntryDescriptor::unpack_from_slice(stream.get_bytes(12)?).unwrap();
        if little_endian {
            entry.id = entry.id.swap_bytes();
            entry.offset = entry.offset.swap_bytes();
            entry.length = entry.length.swap_bytes();
        }
        if entry.id == RESOURCE_FORK_ID {
            return Ok((entry.offset as usize, entry.length as usize));
        }
    }
    Err(ContainerError::MissingResourceFork)
}
