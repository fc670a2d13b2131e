use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use log::debug;
use std::io::{Cursor, Read};

use crate::apple_single::{self, AppleSingle};
use crate::catalog::{Container, ContainerError, ResourceCatalog};
use crate::fork::RawFork;

const LOCAL_HEADER_MAGIC: u32 = 0x0403_4b50;
const CENTRAL_HEADER_MAGIC: u32 = 0x0201_4b50;
const END_OF_CENTRAL_MAGIC: u32 = 0x0605_4b50;
const END_OF_CENTRAL_LEN: usize = 22;
const LOCAL_HEADER_LEN: usize = 30;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// Backend for a resource fork stored as a member of a zip archive. The
/// member bytes are extracted, then sniffed: AppleSingle/AppleDouble headers
/// delegate to that backend, anything else is treated as a raw fork.
pub struct ArchiveEntry {
    inner_path: String,
}

impl ArchiveEntry {
    pub fn new(inner_path: String) -> ArchiveEntry {
        ArchiveEntry{ inner_path }
    }
}

impl Container for ArchiveEntry {
    fn load(&self, bytes: Vec<u8>) -> Result<ResourceCatalog, ContainerError> {
        let member = match extract_member(&bytes, &self.inner_path)? {
            Some(member) => member,
            None => {
                // zip tools stash resource forks as AppleDouble files under
                // __MACOSX, with the file name prefixed "._"
                let fallback = apple_double_path(&self.inner_path);
                debug!("no member {:?}, trying {:?}", self.inner_path, fallback);
                match extract_member(&bytes, &fallback)? {
                    Some(member) => member,
                    None => return Err(ContainerError::NoSuchMember(self.inner_path.clone())),
                }
            }
        };
        if apple_single::is_apple_single(&member) {
            AppleSingle.load(member)
        } else {
            RawFork.load(member)
        }
    }
}

fn apple_double_path(inner_path: &str) -> String {
    let mut path = format!("__MACOSX/{}", inner_path);
    let slash = path.rfind('/').unwrap();
    path.replace_range(slash..slash + 1, "/._");
    path
}

fn find_end_of_central_directory(bytes: &[u8]) -> Result<usize, ContainerError> {
    if bytes.len() < END_OF_CENTRAL_LEN {
        return Err(ContainerError::Malformed("archive too short for a zip directory"));
    }
    // the record floats in front of a variable-length archive comment
    let lowest = bytes.len().saturating_sub(END_OF_CENTRAL_LEN + 0xffff);
    for position in (lowest..=bytes.len() - END_OF_CENTRAL_LEN).rev() {
        if bytes[position..position + 4] == END_OF_CENTRAL_MAGIC.to_le_bytes() {
            return Ok(position);
        }
    }
    Err(ContainerError::Malformed("no zip end-of-central-directory record"))
}

/// Walks the central directory for the named member and returns its
/// decompressed bytes, or None if the archive has no such member.
fn extract_member(bytes: &[u8], inner_path: &str) -> Result<Option<Vec<u8>>, ContainerError> {
    let end_record = find_end_of_central_directory(bytes)?;
    let mut reader = Cursor::new(&bytes[end_record + 4..]);
    reader.read_u16::<LittleEndian>()?; // disk number
    reader.read_u16::<LittleEndian>()?; // central directory disk
    reader.read_u16::<LittleEndian>()?; // entries on this disk
    let entry_count = reader.read_u16::<LittleEndian>()?;
    reader.read_u32::<LittleEndian>()?; // central directory size
    let directory_offset = reader.read_u32::<LittleEndian>()? as usize;

    if directory_offset > bytes.len() {
        return Err(ContainerError::Malformed("central directory outside the archive"));
    }
    let mut reader = Cursor::new(&bytes[directory_offset..]);
    for _ in 0..entry_count {
        if reader.read_u32::<LittleEndian>()? != CENTRAL_HEADER_MAGIC {
            return Err(ContainerError::Malformed("bad central directory entry"));
        }
        reader.read_u32::<LittleEndian>()?; // versions
        reader.read_u16::<LittleEndian>()?; // flags
        let method = reader.read_u16::<LittleEndian>()?;
        reader.read_u32::<LittleEndian>()?; // modification time and date
        reader.read_u32::<LittleEndian>()?; // crc32
        let compressed_size = reader.read_u32::<LittleEndian>()? as usize;
        let uncompressed_size = reader.read_u32::<LittleEndian>()? as usize;
        let name_length = reader.read_u16::<LittleEndian>()? as usize;
        let extra_length = reader.read_u16::<LittleEndian>()? as usize;
        let comment_length = reader.read_u16::<LittleEndian>()? as usize;
        reader.read_u32::<LittleEndian>()?; // disk start, internal attributes
        reader.read_u32::<LittleEndian>()?; // external attributes
        let local_offset = reader.read_u32::<LittleEndian>()? as usize;

        let mut name = vec![0; name_length];
        reader.read_exact(&mut name)?;
        let position = reader.position() + (extra_length + comment_length) as u64;
        reader.set_position(position);

        if name != inner_path.as_bytes() {
            continue;
        }

        // the sizes in the local header may be deferred to a data
        // descriptor, so trust the central directory's numbers
        let mut local = Cursor::new(bytes.get(local_offset..)
            .ok_or(ContainerError::Malformed("local header outside the archive"))?);
        if local.read_u32::<LittleEndian>()? != LOCAL_HEADER_MAGIC {
            return Err(ContainerError::Malformed("bad local file header"));
        }
        local.set_position(26);
        let local_name_length = local.read_u16::<LittleEndian>()? as usize;
        let local_extra_length = local.read_u16::<LittleEndian>()? as usize;
        let data_start = local_offset + LOCAL_HEADER_LEN + local_name_length + local_extra_length;
        let data = bytes.get(data_start..data_start + compressed_size)
            .ok_or(ContainerError::Malformed("member data outside the archive"))?;

        let member = match method {
            METHOD_STORED => data.to_vec(),
            METHOD_DEFLATED => {
                let mut inflated = Vec::with_capacity(uncompressed_size);
                DeflateDecoder::new(data).read_to_end(&mut inflated)?;
                inflated
            }
            _ => return Err(ContainerError::Malformed("unsupported zip compression method")),
        };
        return Ok(Some(member));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    use crate::fork::testdata::{build_fork, sample_resources};

    fn put16(out: &mut Vec<u8>, value: u16) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    fn put32(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    fn build_zip(members: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();
        let mut count = 0u16;
        for (name, data, deflate) in members {
            let offset = out.len() as u32;
            let (method, packed) = if *deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data).unwrap();
                (METHOD_DEFLATED, encoder.finish().unwrap())
            } else {
                (METHOD_STORED, data.to_vec())
            };

            put32(&mut out, LOCAL_HEADER_MAGIC);
            put16(&mut out, 20); // version needed
            put16(&mut out, 0); // flags
            put16(&mut out, method);
            put32(&mut out, 0); // time and date
            put32(&mut out, 0); // crc32, not validated here
            put32(&mut out, packed.len() as u32);
            put32(&mut out, data.len() as u32);
            put16(&mut out, name.len() as u16);
            put16(&mut out, 0); // extra length
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&packed);

            put32(&mut central, CENTRAL_HEADER_MAGIC);
            put16(&mut central, 20); // version made by
            put16(&mut central, 20); // version needed
            put16(&mut central, 0);
            put16(&mut central, method);
            put32(&mut central, 0);
            put32(&mut central, 0);
            put32(&mut central, packed.len() as u32);
            put32(&mut central, data.len() as u32);
            put16(&mut central, name.len() as u16);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put32(&mut central, 0);
            put32(&mut central, offset);
            central.extend_from_slice(name.as_bytes());
            count += 1;
        }

        let directory_offset = out.len() as u32;
        out.extend_from_slice(&central);
        put32(&mut out, END_OF_CENTRAL_MAGIC);
        put16(&mut out, 0);
        put16(&mut out, 0);
        put16(&mut out, count);
        put16(&mut out, count);
        put32(&mut out, central.len() as u32);
        put32(&mut out, directory_offset);
        put16(&mut out, 0); // comment length
        out
    }

    fn assert_same_catalog(a: &ResourceCatalog, b: &ResourceCatalog) {
        assert_eq!(a.types(), b.types());
        for code in a.types() {
            let entries_a = a.entries(code).unwrap();
            let entries_b = b.entries(code).unwrap();
            assert_eq!(entries_a.len(), entries_b.len());
            for (ea, eb) in entries_a.iter().zip(entries_b) {
                assert_eq!(ea.id, eb.id);
                assert_eq!(ea.name, eb.name);
                assert_eq!(a.data(ea), b.data(eb));
            }
        }
    }

    #[test]
    fn stored_member_matches_the_raw_backend() {
        let fork = build_fork(&sample_resources());
        let raw = RawFork.load(fork.clone()).unwrap();
        let zip = build_zip(&[("readme.txt", b"hello", false), ("game.rsrc", &fork, false)]);
        let catalog = ArchiveEntry::new("game.rsrc".to_string()).load(zip).unwrap();
        assert_same_catalog(&raw, &catalog);
    }

    #[test]
    fn deflated_member_matches_the_raw_backend() {
        let fork = build_fork(&sample_resources());
        let raw = RawFork.load(fork.clone()).unwrap();
        let zip = build_zip(&[("game.rsrc", &fork, true)]);
        let catalog = ArchiveEntry::new("game.rsrc".to_string()).load(zip).unwrap();
        assert_same_catalog(&raw, &catalog);
    }

    #[test]
    fn missing_member_fails() {
        let zip = build_zip(&[("readme.txt", b"hello", false)]);
        match ArchiveEntry::new("game.rsrc".to_string()).load(zip) {
            Err(ContainerError::NoSuchMember(name)) => assert_eq!(name, "game.rsrc"),
            _ => panic!("a missing member must fail"),
        }
    }

    #[test]
    fn apple_double_convention_is_tried() {
        assert_eq!(apple_double_path("game"), "__MACOSX/._game");
        assert_eq!(apple_double_path("dir/game"), "__MACOSX/dir/._game");

        let fork = build_fork(&sample_resources());
        let raw = RawFork.load(fork.clone()).unwrap();
        // AppleDouble wrapper around the fork, stashed the way zip tools do
        let mut double = Vec::new();
        double.extend_from_slice(&0x0005_1607u32.to_be_bytes());
        double.extend_from_slice(&0x0002_0000u32.to_be_bytes());
        double.extend_from_slice(&[0; 16]);
        double.extend_from_slice(&1u16.to_be_bytes());
        double.extend_from_slice(&2u32.to_be_bytes());
        double.extend_from_slice(&38u32.to_be_bytes());
        double.extend_from_slice(&(fork.len() as u32).to_be_bytes());
        double.extend_from_slice(&fork);

        let zip = build_zip(&[("readme.txt", b"hello", false), ("__MACOSX/._game", &double, false)]);
        let catalog = ArchiveEntry::new("game".to_string()).load(zip).unwrap();
        assert_same_catalog(&raw, &catalog);
    }
}
