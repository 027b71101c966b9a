use super::super::consts::*;

/// Locations written into the 512-byte header.
#[derive(Debug, Clone)]
pub(super) struct HeaderLayout {
    pub(super) first_dir_sector: u32,
    pub(super) first_minifat_sector: u32,
    pub(super) num_minifat_sectors: u32,
    pub(super) first_difat_sector: u32,
    pub(super) num_difat_sectors: u32,
    /// Every FAT sector, in order; only the first 109 go into the header
    pub(super) fat_sectors: Vec<u32>,
}

impl HeaderLayout {
    /// Encode a version 3 header (512-byte sectors).
    pub(super) fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        // Bytes 8..24 are the zero CLSID.
        put_u16(&mut header, 0x18, 0x003E);
        put_u16(&mut header, 0x1A, 0x0003);
        put_u16(&mut header, 0x1C, 0xFFFE);
        put_u16(&mut header, 0x1E, 9);
        put_u16(&mut header, 0x20, 6);
        // 0x22..0x2C reserved; directory sector count stays 0 in version 3.
        put_u32(&mut header, 0x2C, self.fat_sectors.len() as u32);
        put_u32(&mut header, 0x30, self.first_dir_sector);
        put_u32(&mut header, 0x38, MINI_STREAM_CUTOFF);
        put_u32(&mut header, 0x3C, self.first_minifat_sector);
        put_u32(&mut header, 0x40, self.num_minifat_sectors);
        put_u32(&mut header, 0x44, self.first_difat_sector);
        put_u32(&mut header, 0x48, self.num_difat_sectors);

        for slot in 0..HEADER_FAT_SLOTS {
            let value = self.fat_sectors.get(slot).copied().unwrap_or(FREESECT);
            put_u32(&mut header, 0x4C + slot * 4, value);
        }
        header
    }
}

/// Encode DIFAT sectors holding the FAT locations beyond the header's 109 slots.
pub(super) fn difat_bytes(
    fat_sectors: &[u32],
    first_difat_sector: u32,
    count: u32,
    sector_size: usize,
) -> Vec<u8> {
    let per_sector = sector_size / 4 - 1;
    let overflow = fat_sectors.get(HEADER_FAT_SLOTS..).unwrap_or_default();
    let mut out = vec![0u8; count as usize * sector_size];

    for index in 0..count as usize {
        let base = index * sector_size;
        for slot in 0..per_sector {
            let value = overflow.get(index * per_sector + slot).copied().unwrap_or(FREESECT);
            put_u32(&mut out, base + slot * 4, value);
        }
        let next = if index + 1 < count as usize {
            first_difat_sector + index as u32 + 1
        } else {
            ENDOFCHAIN
        };
        put_u32(&mut out, base + per_sector * 4, next);
    }
    out
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
