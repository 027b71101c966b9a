use super::super::consts::*;

/// Sector allocator that records every chain in the FAT as it hands it out.
///
/// Chains are always contiguous, so a stream of `n` sectors starting at `s`
/// occupies sectors `s..s + n` in the image.
#[derive(Debug)]
pub(super) struct SectorAllocator {
    sector_size: usize,
    fat: Vec<u32>,
}

impl SectorAllocator {
    pub(super) fn new(sector_size: usize) -> Self {
        Self {
            sector_size,
            fat: Vec::new(),
        }
    }

    /// Reserve a chain large enough for `len` bytes. Empty data gets no chain.
    pub(super) fn allocate_chain(&mut self, len: usize) -> u32 {
        if len == 0 {
            return ENDOFCHAIN;
        }
        let start = self.fat.len() as u32;
        let count = len.div_ceil(self.sector_size) as u32;
        for offset in 1..count {
            self.fat.push(start + offset);
        }
        self.fat.push(ENDOFCHAIN);
        start
    }

    /// Reserve `count` sectors marked with `marker` (FATSECT or DIFSECT).
    pub(super) fn allocate_special(&mut self, count: u32, marker: u32) -> u32 {
        if count == 0 {
            return ENDOFCHAIN;
        }
        let start = self.fat.len() as u32;
        self.fat.extend(std::iter::repeat_n(marker, count as usize));
        start
    }

    pub(super) fn total_sectors(&self) -> u32 {
        self.fat.len() as u32
    }

    /// Serialize the FAT into `count` sectors, padding with FREESECT.
    pub(super) fn fat_bytes(&self, count: u32) -> Vec<u8> {
        let slots = count as usize * self.sector_size / 4;
        let mut out = Vec::with_capacity(slots * 4);
        for slot in 0..slots {
            let value = self.fat.get(slot).copied().unwrap_or(FREESECT);
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

/// Packs small streams into the mini stream and builds the mini FAT.
#[derive(Debug, Default)]
pub(super) struct MiniStreamBuilder {
    data: Vec<u8>,
    minifat: Vec<u32>,
}

impl MiniStreamBuilder {
    /// Append a stream and return its first mini sector.
    pub(super) fn append(&mut self, bytes: &[u8]) -> u32 {
        if bytes.is_empty() {
            return ENDOFCHAIN;
        }
        let start = self.minifat.len() as u32;
        let count = bytes.len().div_ceil(MINI_SECTOR_SIZE) as u32;
        for offset in 1..count {
            self.minifat.push(start + offset);
        }
        self.minifat.push(ENDOFCHAIN);

        self.data.extend_from_slice(bytes);
        self.data.resize((start + count) as usize * MINI_SECTOR_SIZE, 0);
        start
    }

    pub(super) fn is_empty(&self) -> bool {
        self.minifat.is_empty()
    }

    /// Mini stream contents, padded to whole mini sectors.
    pub(super) fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serialize the mini FAT, padded with FREESECT to whole sectors.
    pub(super) fn minifat_bytes(&self, sector_size: usize) -> Vec<u8> {
        let slots = (self.minifat.len() * 4).div_ceil(sector_size) * sector_size / 4;
        let mut out = Vec::with_capacity(slots * 4);
        for slot in 0..slots {
            let value = self.minifat.get(slot).copied().unwrap_or(FREESECT);
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}
