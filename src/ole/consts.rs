/// Magic bytes at the beginning of every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Minimal size of a compound file with 512-byte sectors (header + 2 sectors)
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Size of the on-disk header
pub const HEADER_SIZE: usize = 512;

/// Number of FAT sector slots stored directly in the header
pub const HEADER_FAT_SLOTS: usize = 109;

/// Streams smaller than this live in the mini stream
pub const MINI_STREAM_CUTOFF: u32 = 4096;

/// Mini sector size used by every writer we produce
pub const MINI_SECTOR_SIZE: usize = 64;

// Sector IDs
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC;
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD;
/// End of a sector chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF;

/// Unallocated directory entry
pub const NOSTREAM: u32 = 0xFFFFFFFF;

// Object types in storage
/// Element is a storage object
pub const STGTY_STORAGE: u8 = 1;
/// Element is a stream object
pub const STGTY_STREAM: u8 = 2;
/// Element is the root storage
pub const STGTY_ROOT: u8 = 5;
