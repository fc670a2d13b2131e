use std::collections::BTreeMap;
use std::ops::Range;

use crate::apple_single::AppleSingle;
use crate::archive::ArchiveEntry;
use crate::fork::RawFork;
use crate::macroman;
use crate::stream::StreamError;

/// A 4-byte resource type code, e.g. `b"PICT"` or `b"snd "`. Ordering is the
/// plain unsigned comparison of the raw bytes.
pub type TypeCode = [u8; 4];

#[derive(Debug)]
pub enum ContainerError {
    Truncated { at: usize },
    Malformed(&'static str),
    BadMagic(u32),
    UnsupportedVersion(u32),
    MissingResourceFork,
    NoSuchMember(String),
    IoError(std::io::Error),
}

impl From<StreamError> for ContainerError {
    fn from(error: StreamError) -> Self {
        match error {
            StreamError::Truncated{ at } => ContainerError::Truncated{ at },
        }
    }
}

impl From<std::io::Error> for ContainerError {
    fn from(error: std::io::Error) -> Self {
        ContainerError::IoError(error)
    }
}

/// One resource: its id, optional Mac-Roman name, attribute bits and the
/// location of its payload inside the catalog's buffer. The range has been
/// validated at build time.
pub struct ResourceEntry {
    pub id: i16,
    pub name: Option<Vec<u8>>,
    pub attributes: u8,
    pub(crate) data: Range<usize>,
}

impl ResourceEntry {
    /// The entry's name decoded to Unicode; unnamed entries decode empty.
    pub fn name_utf8(&self) -> String {
        match &self.name {
            Some(name) => macroman::decode(name),
            None => String::new(),
        }
    }
}

/// The normalized, immutable resource index every backend produces: the
/// container bytes plus a type code → entries map, entries ascending by id.
pub struct ResourceCatalog {
    buffer: Vec<u8>,
    types: BTreeMap<TypeCode, Vec<ResourceEntry>>,
}

impl ResourceCatalog {
    pub(crate) fn new(buffer: Vec<u8>, types: BTreeMap<TypeCode, Vec<ResourceEntry>>)
            -> ResourceCatalog {
        ResourceCatalog{ buffer, types }
    }

    /// All type codes, ascending by raw byte value, without duplicates.
    pub fn types(&self) -> Vec<TypeCode> {
        self.types.keys().cloned().collect()
    }

    /// The entries of one type, ascending by id.
    pub fn entries(&self, code: TypeCode) -> Option<&[ResourceEntry]> {
        self.types.get(&code).map(|entries| entries.as_slice())
    }

    pub fn lookup(&self, code: TypeCode, id: i16) -> Option<&ResourceEntry> {
        let entries = self.types.get(&code)?;
        entries.binary_search_by_key(&id, |entry| entry.id).ok()
            .map(|index| &entries[index])
    }

    pub fn data(&self, entry: &ResourceEntry) -> &[u8] {
        &self.buffer[entry.data.clone()]
    }
}

/// A container backend: anything that can turn a byte buffer into a catalog.
pub trait Container {
    fn load(&self, bytes: Vec<u8>) -> Result<ResourceCatalog, ContainerError>;
}

/// How the caller says its buffer is encoded. Archive entries carry the inner
/// path of the member holding the resource fork.
pub enum ContainerKind {
    RawFork,
    AppleSingle,
    ArchiveEntry(String),
}

pub fn load(bytes: Vec<u8>, kind: &ContainerKind) -> Result<ResourceCatalog, ContainerError> {
    match kind {
        ContainerKind::RawFork => RawFork.load(bytes),
        ContainerKind::AppleSingle => AppleSingle.load(bytes),
        ContainerKind::ArchiveEntry(path) => ArchiveEntry::new(path.clone()).load(bytes),
    }
}
