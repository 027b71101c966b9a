use super::consts::*;
use crate::common::binary::{BinaryError, read_u16_le, read_u32_le};
use std::io::{self, Read, Seek, SeekFrom};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout};

/// On-disk layout of a 128-byte directory entry.
#[derive(Debug, Clone, DeriveFromBytes, KnownLayout, Immutable)]
#[repr(C)]
#[allow(dead_code)]
struct RawDirectoryEntry {
    /// UTF-16LE name, null padded
    name: [u8; 64],
    /// Name length in bytes including the terminator
    name_len: U16<LE>,
    entry_type: u8,
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// A stream or storage entry in the container directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Entry name decoded from UTF-16
    pub name: String,
    /// One of `STGTY_STORAGE`, `STGTY_STREAM` or `STGTY_ROOT` (0 for unused slots)
    pub entry_type: u8,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// First sector of the stream (regular or mini sector)
    pub start_sector: u32,
    /// Stream size in bytes
    pub size: u64,
}

impl DirectoryEntry {
    pub fn is_stream(&self) -> bool {
        self.entry_type == STGTY_STREAM
    }

    pub fn is_storage(&self) -> bool {
        self.entry_type == STGTY_STORAGE || self.entry_type == STGTY_ROOT
    }
}

/// Errors raised while reading a compound file.
#[derive(Debug, thiserror::Error)]
pub enum OleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Not a compound file")]
    NotOleFile,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    #[error("Stream not found: {0}")]
    StreamNotFound(String),
}

impl From<BinaryError> for OleError {
    fn from(err: BinaryError) -> Self {
        OleError::CorruptedFile(err.to_string())
    }
}

/// Quick signature check for compound file bytes.
pub fn is_ole_file(bytes: &[u8]) -> bool {
    bytes.len() >= MINIMAL_OLEFILE_SIZE && bytes.starts_with(MAGIC)
}

/// Reader for a compound binary file.
///
/// The FAT, mini FAT and directory are loaded eagerly by [`OleFile::open`];
/// stream contents are read on demand.
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    file_size: u64,
    sector_size: usize,
    mini_sector_size: usize,
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    /// Directory entries indexed by SID; entry 0 is the root
    entries: Vec<DirectoryEntry>,
    /// Mini stream contents, loaded on first access to a small stream
    ministream: Option<Vec<u8>>,
}

impl<R: Read + Seek> OleFile<R> {
    /// Parse the header, FAT, directory and mini FAT of a compound file.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOleFile);
        }

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        if &header[0..8] != MAGIC {
            return Err(OleError::NotOleFile);
        }

        if read_u16_le(&header, 0x1C)? != 0xFFFE {
            return Err(OleError::InvalidFormat("byte order mark is not little-endian".into()));
        }

        let sector_shift = read_u16_le(&header, 0x1E)?;
        let mini_sector_shift = read_u16_le(&header, 0x20)?;
        if !(sector_shift == 9 || sector_shift == 12) || mini_sector_shift != 6 {
            return Err(OleError::InvalidFormat(format!(
                "unsupported sector shift {sector_shift}/{mini_sector_shift}"
            )));
        }

        let first_dir_sector = read_u32_le(&header, 0x30)?;
        let mini_stream_cutoff = read_u32_le(&header, 0x38)?;
        let first_minifat_sector = read_u32_le(&header, 0x3C)?;
        let num_minifat_sectors = read_u32_le(&header, 0x40)?;
        let first_difat_sector = read_u32_le(&header, 0x44)?;
        let num_difat_sectors = read_u32_le(&header, 0x48)?;

        let mut ole = OleFile {
            reader,
            file_size,
            sector_size: 1usize << sector_shift,
            mini_sector_size: 1usize << mini_sector_shift,
            mini_stream_cutoff,
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            ministream: None,
        };

        ole.load_fat(&header, first_difat_sector, num_difat_sectors)?;
        ole.load_directory(first_dir_sector)?;
        if num_minifat_sectors > 0 && first_minifat_sector != ENDOFCHAIN {
            ole.load_minifat(first_minifat_sector)?;
        }

        Ok(ole)
    }

    /// Size of the underlying file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    fn load_fat(
        &mut self,
        header: &[u8; HEADER_SIZE],
        first_difat_sector: u32,
        num_difat_sectors: u32,
    ) -> Result<(), OleError> {
        let mut fat_sectors = Vec::new();
        for slot in 0..HEADER_FAT_SLOTS {
            let sector = read_u32_le(header, 0x4C + slot * 4)?;
            if sector == FREESECT || sector == ENDOFCHAIN {
                break;
            }
            fat_sectors.push(sector);
        }

        // DIFAT sectors hold FAT locations past the first 109; the last slot chains on.
        let per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = first_difat_sector;
        for _ in 0..num_difat_sectors {
            if difat_sector == ENDOFCHAIN || difat_sector == FREESECT {
                break;
            }
            let data = self.read_sector(difat_sector)?;
            for slot in 0..per_difat {
                let sector = read_u32_le(&data, slot * 4)?;
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            difat_sector = read_u32_le(&data, per_difat * 4)?;
        }

        let per_sector = self.sector_size / 4;
        self.fat.reserve(fat_sectors.len() * per_sector);
        for sector in fat_sectors {
            let data = self.read_sector(sector)?;
            for slot in 0..per_sector {
                self.fat.push(read_u32_le(&data, slot * 4)?);
            }
        }

        Ok(())
    }

    fn load_minifat(&mut self, first_sector: u32) -> Result<(), OleError> {
        let data = self.read_chain(first_sector)?;
        self.minifat = data
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(())
    }

    fn load_directory(&mut self, first_sector: u32) -> Result<(), OleError> {
        let data = self.read_chain(first_sector)?;
        let is_small_sector = self.sector_size == 512;

        self.entries = data
            .chunks_exact(DIRENTRY_SIZE)
            .map(|chunk| {
                let raw = RawDirectoryEntry::read_from_bytes(chunk).map_err(|_| {
                    OleError::CorruptedFile("short directory entry".into())
                })?;
                Ok(parse_entry(&raw, is_small_sector))
            })
            .collect::<Result<Vec<_>, OleError>>()?;

        match self.entries.first() {
            Some(root) if root.entry_type == STGTY_ROOT => Ok(()),
            _ => Err(OleError::CorruptedFile("missing root directory entry".into())),
        }
    }

    fn read_sector(&mut self, sector: u32) -> Result<Vec<u8>, OleError> {
        let position = (u64::from(sector) + 1) * self.sector_size as u64;
        if position + self.sector_size as u64 > self.file_size {
            return Err(OleError::CorruptedFile(format!(
                "sector {sector} lies past the end of the file"
            )));
        }
        self.reader.seek(SeekFrom::Start(position))?;
        let mut buffer = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Follow a FAT chain and concatenate its sectors.
    fn read_chain(&mut self, start_sector: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start_sector;
        let mut steps = 0usize;

        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() {
                return Err(OleError::CorruptedFile(format!(
                    "sector {sector} is outside the allocation table"
                )));
            }
            steps += 1;
            if steps > self.fat.len() {
                return Err(OleError::CorruptedFile("sector chain loops".into()));
            }
            data.extend_from_slice(&self.read_sector(sector)?);
            sector = self.fat[sector as usize];
        }

        Ok(data)
    }

    /// Follow a mini FAT chain inside the mini stream.
    fn read_mini_chain(&mut self, start_sector: u32, size: u64) -> Result<Vec<u8>, OleError> {
        if self.ministream.is_none() {
            let root_start = self.entries[0].start_sector;
            let root_size = self.entries[0].size as usize;
            let mut stream = self.read_chain(root_start)?;
            stream.truncate(root_size);
            self.ministream = Some(stream);
        }
        let ministream = self.ministream.as_deref().unwrap_or_default();

        let mut data = Vec::with_capacity(size as usize);
        let mut sector = start_sector;
        let mut steps = 0usize;

        while sector != ENDOFCHAIN && (data.len() as u64) < size {
            let position = sector as usize * self.mini_sector_size;
            if sector as usize >= self.minifat.len()
                || position + self.mini_sector_size > ministream.len()
            {
                return Err(OleError::CorruptedFile(format!(
                    "mini sector {sector} is out of range"
                )));
            }
            steps += 1;
            if steps > self.minifat.len() {
                return Err(OleError::CorruptedFile("mini sector chain loops".into()));
            }
            data.extend_from_slice(&ministream[position..position + self.mini_sector_size]);
            sector = self.minifat[sector as usize];
        }

        if (data.len() as u64) < size {
            return Err(OleError::CorruptedFile("mini stream is truncated".into()));
        }
        data.truncate(size as usize);
        Ok(data)
    }

    /// List every stream as a path of storage names.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        self.collect_paths(DirectoryEntry::is_stream)
    }

    /// List every storage below the root, empty ones included.
    pub fn list_storages(&self) -> Vec<Vec<String>> {
        self.collect_paths(DirectoryEntry::is_storage)
    }

    fn collect_paths(&self, wanted: fn(&DirectoryEntry) -> bool) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.walk(self.entries[0].sid_child, &mut prefix, &mut paths, wanted, 0);
        paths
    }

    fn walk(
        &self,
        sid: u32,
        prefix: &mut Vec<String>,
        paths: &mut Vec<Vec<String>>,
        wanted: fn(&DirectoryEntry) -> bool,
        depth: usize,
    ) {
        // A well-formed tree never nests deeper than it has entries.
        if depth > self.entries.len() {
            return;
        }
        let Some(entry) = self.entry_at(sid) else {
            return;
        };

        self.walk(entry.sid_left, prefix, paths, wanted, depth + 1);

        prefix.push(entry.name.clone());
        if wanted(entry) {
            paths.push(prefix.clone());
        }
        if entry.is_storage() {
            self.walk(entry.sid_child, prefix, paths, wanted, depth + 1);
        }
        prefix.pop();

        self.walk(entry.sid_right, prefix, paths, wanted, depth + 1);
    }

    /// Read a whole stream by its storage path, e.g. `&["BodyText", "Section0"]`.
    ///
    /// Names compare case-insensitively.
    pub fn open_stream(&mut self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self.find_entry(path)?.clone();
        if !entry.is_stream() {
            return Err(OleError::InvalidFormat(format!("{} is not a stream", path.join("/"))));
        }

        if entry.size < u64::from(self.mini_stream_cutoff) {
            self.read_mini_chain(entry.start_sector, entry.size)
        } else {
            let mut data = self.read_chain(entry.start_sector)?;
            if (data.len() as u64) < entry.size {
                return Err(OleError::CorruptedFile(format!(
                    "stream {} is truncated",
                    path.join("/")
                )));
            }
            data.truncate(entry.size as usize);
            Ok(data)
        }
    }

    /// Whether a stream or storage exists at `path`.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    fn find_entry(&self, path: &[&str]) -> Result<&DirectoryEntry, OleError> {
        let not_found = || OleError::StreamNotFound(path.join("/"));
        let mut current = &self.entries[0];
        for name in path {
            current = self
                .find_child(current.sid_child, name, 0)
                .ok_or_else(not_found)?;
        }
        Ok(current)
    }

    fn find_child(&self, sid: u32, name: &str, depth: usize) -> Option<&DirectoryEntry> {
        if depth > self.entries.len() {
            return None;
        }
        let entry = self.entry_at(sid)?;
        if entry.name.to_lowercase() == name.to_lowercase() {
            return Some(entry);
        }
        self.find_child(entry.sid_left, name, depth + 1)
            .or_else(|| self.find_child(entry.sid_right, name, depth + 1))
    }

    fn entry_at(&self, sid: u32) -> Option<&DirectoryEntry> {
        if sid == NOSTREAM {
            return None;
        }
        self.entries.get(sid as usize).filter(|e| e.entry_type != 0)
    }
}

fn parse_entry(raw: &RawDirectoryEntry, is_small_sector: bool) -> DirectoryEntry {
    let name_len = (raw.name_len.get() as usize).saturating_sub(2).min(64);
    let units: Vec<u16> = raw.name[..name_len]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let name = String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string();

    // Version 3 files only define the low 32 bits of the size.
    let size = if is_small_sector {
        raw.stream_size.get() & 0xFFFF_FFFF
    } else {
        raw.stream_size.get()
    };

    DirectoryEntry {
        name,
        entry_type: raw.entry_type,
        sid_left: raw.sid_left.get(),
        sid_right: raw.sid_right.get(),
        sid_child: raw.sid_child.get(),
        start_sector: raw.start_sector.get(),
        size,
    }
}
