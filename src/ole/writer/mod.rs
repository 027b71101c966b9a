//! Compound file writer.
//!
//! Streams are collected in memory and laid out in a single pass when the
//! container is written: large streams first, then the mini stream, the
//! directory, the mini FAT and finally the FAT and DIFAT sectors that
//! describe everything before them.

mod alloc;
mod directory;
mod header;


use super::consts::*;
use super::file::OleError;
use alloc::{MiniStreamBuilder, SectorAllocator};
use directory::DirectoryBuilder;
use header::{HeaderLayout, difat_bytes};
use std::collections::{BTreeMap, BTreeSet};

/// Sector size of containers produced by [`OleWriter`].
const SECTOR_SIZE: usize = 512;

/// Builder for a new compound file.
///
/// # Examples
///
/// ```rust
/// use hanji::ole::{OleFile, OleWriter};
/// use std::io::Cursor;
///
/// let mut writer = OleWriter::new();
/// writer.create_stream(&["BodyText", "Section0"], b"hello").unwrap();
/// let bytes = writer.to_bytes().unwrap();
///
/// let mut ole = OleFile::open(Cursor::new(bytes)).unwrap();
/// assert_eq!(ole.open_stream(&["BodyText", "Section0"]).unwrap(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct OleWriter {
    streams: BTreeMap<Vec<String>, Vec<u8>>,
    storages: BTreeSet<Vec<String>>,
}

impl OleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a stream. Parent storages are created implicitly.
    pub fn create_stream(&mut self, path: &[&str], data: &[u8]) -> Result<(), OleError> {
        let path = owned_path(path)?;
        self.streams.insert(path, data.to_vec());
        Ok(())
    }

    /// Add an empty storage, e.g. one that holds no streams.
    pub fn create_storage(&mut self, path: &[&str]) -> Result<(), OleError> {
        let path = owned_path(path)?;
        self.storages.insert(path);
        Ok(())
    }

    /// Lay out the container into a byte buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OleError> {
        let mut sectors = SectorAllocator::new(SECTOR_SIZE);
        let mut mini = MiniStreamBuilder::default();
        let mut placed: Vec<(&[String], u32, &[u8])> = Vec::new();
        let mut directory_rows: Vec<(&[String], u32, u64)> = Vec::new();

        for (path, data) in &self.streams {
            let start = if data.len() < MINI_STREAM_CUTOFF as usize {
                mini.append(data)
            } else {
                let start = sectors.allocate_chain(data.len());
                placed.push((path, start, data));
                start
            };
            directory_rows.push((path, start, data.len() as u64));
        }

        let ministream_start = sectors.allocate_chain(mini.data().len());
        if !mini.is_empty() {
            placed.push((&[], ministream_start, mini.data()));
        }

        let mut directory = DirectoryBuilder::new(ministream_start, mini.data().len() as u64);
        for storage in &self.storages {
            directory.add_storage_path(storage);
        }
        for (path, start, size) in directory_rows {
            directory.add_stream_path(path, start, size);
        }
        let dir_bytes = directory.to_bytes(SECTOR_SIZE);
        let dir_start = sectors.allocate_chain(dir_bytes.len());

        let minifat_bytes = mini.minifat_bytes(SECTOR_SIZE);
        let minifat_start = sectors.allocate_chain(minifat_bytes.len());
        let num_minifat = (minifat_bytes.len() / SECTOR_SIZE) as u32;

        let (num_fat, num_difat) = fat_sector_counts(sectors.total_sectors());
        let difat_start = sectors.allocate_special(num_difat, DIFSECT);
        let fat_start = sectors.allocate_special(num_fat, FATSECT);
        let fat_ids: Vec<u32> = (fat_start..fat_start + num_fat).collect();

        let layout = HeaderLayout {
            first_dir_sector: dir_start,
            first_minifat_sector: minifat_start,
            num_minifat_sectors: num_minifat,
            first_difat_sector: difat_start,
            num_difat_sectors: num_difat,
            fat_sectors: fat_ids.clone(),
        };

        let total = sectors.total_sectors() as usize;
        let mut image = vec![0u8; HEADER_SIZE + total * SECTOR_SIZE];
        image[..HEADER_SIZE].copy_from_slice(&layout.to_bytes());

        let mut put = |start: u32, bytes: &[u8]| {
            if start == ENDOFCHAIN || bytes.is_empty() {
                return;
            }
            let offset = HEADER_SIZE + start as usize * SECTOR_SIZE;
            image[offset..offset + bytes.len()].copy_from_slice(bytes);
        };

        for (_, start, data) in &placed {
            put(*start, data);
        }
        put(dir_start, &dir_bytes);
        put(minifat_start, &minifat_bytes);
        put(difat_start, &difat_bytes(&fat_ids, difat_start, num_difat, SECTOR_SIZE));
        put(fat_start, &sectors.fat_bytes(num_fat));

        Ok(image)
    }
}

fn owned_path(path: &[&str]) -> Result<Vec<String>, OleError> {
    if path.is_empty() || path.iter().any(|name| name.is_empty()) {
        return Err(OleError::InvalidFormat("empty storage path".into()));
    }
    Ok(path.iter().map(|name| name.to_string()).collect())
}

/// Number of FAT and DIFAT sectors needed to describe `used` data sectors
/// plus themselves.
fn fat_sector_counts(used: u32) -> (u32, u32) {
    let per_fat = (SECTOR_SIZE / 4) as u32;
    let per_difat = per_fat - 1;
    let mut num_fat = 0;
    let mut num_difat = 0;

    loop {
        let needed_fat = (used + num_fat + num_difat).div_ceil(per_fat);
        let needed_difat = needed_fat
            .saturating_sub(HEADER_FAT_SLOTS as u32)
            .div_ceil(per_difat);
        if needed_fat == num_fat && needed_difat == num_difat {
            return (num_fat, num_difat);
        }
        num_fat = needed_fat;
        num_difat = needed_difat;
    }
}
