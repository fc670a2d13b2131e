use log::info;
use packed_struct::prelude::*;
use std::collections::BTreeMap;

use crate::catalog::{Container, ContainerError, ResourceCatalog, ResourceEntry, TypeCode};
use crate::stream::Streamer;

#[derive(PackedStruct)]
#[packed_struct(endian="msb")]
pub struct ForkHeader {
    pub data_offset: u32,
    pub map_offset: u32,
    pub data_length: u32,
    pub map_length: u32,
}

// resource map layout: a copy of the header, handle/file-ref/attribute
// fields, then the type list and name list offsets
const MAP_TYPE_LIST_FIELD: usize = 24;
const NO_NAME: u16 = 0xffff;

/// Backend for a bare resource fork, the layout the other two backends
/// eventually delegate to.
pub struct RawFork;

impl Container for RawFork {
    fn load(&self, bytes: Vec<u8>) -> Result<ResourceCatalog, ContainerError> {
        let length = bytes.len();
        let types = parse_fork(&bytes, 0, length)?;
        Ok(ResourceCatalog::new(bytes, types))
    }
}

/// Parses the resource fork occupying `buffer[base..base + length]` into the
/// catalog's type map, with every emitted data range validated against the
/// fork's own data area. Ranges are absolute within `buffer`.
pub(crate) fn parse_fork(buffer: &[u8], base: usize, length: usize)
        -> Result<BTreeMap<TypeCode, Vec<ResourceEntry>>, ContainerError> {
    let fork = buffer.get(base..base.checked_add(length)
            .ok_or(ContainerError::Malformed("resource fork length overflows"))?)
        .ok_or(ContainerError::Malformed("resource fork lies outside the buffer"))?;

    let mut stream = Streamer::new(fork);
    let header = ForkHeader::unpack_from_slice(stream.get_bytes(16)?).unwrap();
    let map = stream.slice_at(header.map_offset as usize, header.map_length as usize)?;
    let data = stream.slice_at(header.data_offset as usize, header.data_length as usize)?;

    let mut map_stream = Streamer::new(map);
    map_stream.seek(MAP_TYPE_LIST_FIELD)?;
    let type_offset = map_stream.get_u16()? as usize;
    let name_offset = map_stream.get_u16()? as usize;
    let type_count = map_stream.get_u16()?.wrapping_add(1);

    let mut types: BTreeMap<TypeCode, BTreeMap<i16, ResourceEntry>> = BTreeMap::new();
    for type_index in 0..type_count as usize {
        map_stream.seek(type_offset + 2 + type_index * 8)?;
        let code_bytes = map_stream.get_bytes(4)?;
        let code: TypeCode = [code_bytes[0], code_bytes[1], code_bytes[2], code_bytes[3]];
        let entry_count = map_stream.get_u16()?.wrapping_add(1);
        let reference_offset = map_stream.get_u16()? as usize;

        let entries = types.entry(code).or_insert_with(BTreeMap::new);
        for entry_index in 0..entry_count as usize {
            let mut reference = Streamer::new(map);
            reference.seek(type_offset + reference_offset + entry_index * 12)?;
            let id = reference.get_i16()?;
            let entry_name_offset = reference.get_u16()?;
            let attributes_and_offset = reference.get_u32()?;
            let attributes = (attributes_and_offset >> 24) as u8;
            let data_offset = (attributes_and_offset & 0x00ff_ffff) as usize;

            let name = if entry_name_offset != NO_NAME {
                let mut names = Streamer::new(map);
                names.seek(name_offset + entry_name_offset as usize)?;
                let name_length = names.get_byte()?;
                Some(names.get_bytes(name_length as usize)?.to_vec())
            } else {
                None
            };

            let mut payload = Streamer::new(data);
            payload.seek(data_offset)?;
            let size = payload.get_u32()? as usize;
            if size > payload.remaining() {
                return Err(ContainerError::Malformed("resource data runs past the data area"));
            }
            let start = base + header.data_offset as usize + data_offset + 4;
            entries.insert(id, ResourceEntry{ id, name, attributes, data: start..start + size });
        }
    }

    let catalog: BTreeMap<TypeCode, Vec<ResourceEntry>> = types.into_iter()
        .map(|(code, entries)| (code, entries.into_iter().map(|(_, entry)| entry).collect()))
        .collect();
    info!("resource fork holds {} type(s)", catalog.len());
    Ok(catalog)
}

#[cfg(test)]
pub(crate) mod testdata {
    use super::*;

    pub(crate) struct Res {
        pub code: TypeCode,
        pub id: i16,
        pub name: Option<&'static [u8]>,
        pub attributes: u8,
        pub data: &'static [u8],
    }

    pub(crate) fn res(code: &[u8; 4], id: i16, name: Option<&'static [u8]>,
                      data: &'static [u8]) -> Res {
        Res{ code: *code, id, name, attributes: 0, data }
    }

    /// Builds a byte-exact resource fork around the given resources, in the
    /// order given (the parser must not depend on any ordering).
    pub(crate) fn build_fork(resources: &[Res]) -> Vec<u8> {
        // data area, one length-prefixed blob per resource
        let mut data_area = Vec::new();
        let mut data_offsets = Vec::new();
        for resource in resources {
            data_offsets.push(data_area.len() as u32);
            data_area.extend_from_slice(&(resource.data.len() as u32).to_be_bytes());
            data_area.extend_from_slice(resource.data);
        }

        // name list
        let mut name_list = Vec::new();
        let mut name_offsets = Vec::new();
        for resource in resources {
            match resource.name {
                Some(name) => {
                    name_offsets.push(name_list.len() as u16);
                    name_list.push(name.len() as u8);
                    name_list.extend_from_slice(name);
                }
                None => name_offsets.push(NO_NAME),
            }
        }

        // group resource indices by type, first-seen order
        let mut groups: Vec<(TypeCode, Vec<usize>)> = Vec::new();
        for (index, resource) in resources.iter().enumerate() {
            match groups.iter_mut().find(|(code, _)| *code == resource.code) {
                Some((_, members)) => members.push(index),
                None => groups.push((resource.code, vec![index])),
            }
        }

        let type_list_len = 2 + 8 * groups.len();
        let mut type_list = Vec::new();
        type_list.extend_from_slice(&(groups.len() as u16 - 1).to_be_bytes());
        let mut reference_lists = Vec::new();
        for (code, members) in &groups {
            type_list.extend_from_slice(code);
            type_list.extend_from_slice(&(members.len() as u16 - 1).to_be_bytes());
            type_list.extend_from_slice(&((type_list_len + reference_lists.len()) as u16).to_be_bytes());
            for &index in members {
                let resource = &resources[index];
                reference_lists.extend_from_slice(&resource.id.to_be_bytes());
                reference_lists.extend_from_slice(&name_offsets[index].to_be_bytes());
                let word = ((resource.attributes as u32) << 24) | data_offsets[index];
                reference_lists.extend_from_slice(&word.to_be_bytes());
                reference_lists.extend_from_slice(&[0; 4]);
            }
        }

        let mut map = vec![0u8; MAP_TYPE_LIST_FIELD];
        map.extend_from_slice(&28u16.to_be_bytes()); // type list offset
        let name_list_offset = 28 + type_list_len + reference_lists.len();
        map.extend_from_slice(&(name_list_offset as u16).to_be_bytes());
        map.extend_from_slice(&type_list);
        map.extend_from_slice(&reference_lists);
        map.extend_from_slice(&name_list);

        let mut fork = Vec::new();
        fork.extend_from_slice(&16u32.to_be_bytes()); // data offset
        fork.extend_from_slice(&(16 + data_area.len() as u32).to_be_bytes()); // map offset
        fork.extend_from_slice(&(data_area.len() as u32).to_be_bytes());
        fork.extend_from_slice(&(map.len() as u32).to_be_bytes());
        fork.extend_from_slice(&data_area);
        fork.extend_from_slice(&map);
        fork
    }

    pub(crate) fn sample_resources() -> Vec<Res> {
        vec![
            res(b"snd ", 9000, None, b"\x00\x01"),
            // a TEXT resource deliberately *named* like another type code,
            // to pin down that listing a type reads the name field
            res(b"TEXT", 128, Some(b"PICT"), b"Hello\rworld\r"),
            res(b"TEXT", 1, None, b"second"),
            res(b"PICT", -2, Some(b"painting"), b"\x00\x00"),
            res(b"cicn", 300, Some(b"ic\x8cne"), &[1, 2, 3, 4, 5]),
        ]
    }
}
