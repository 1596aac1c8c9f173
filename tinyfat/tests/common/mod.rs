#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tinyfat::{BLOCK_SIZE, BlockDevice, DeviceError, FileSystem};

pub use block_dev::RamDisk;

/// 8192个数据块的卷
pub const DISK_BLOCKS: usize = 8192 + 4 + 2;

pub fn formatted(blocks: usize) -> Arc<RamDisk> {
    let disk = Arc::new(RamDisk::new(blocks));
    FileSystem::format(&*disk).unwrap();
    disk
}

pub fn mount(disk: Arc<dyn BlockDevice>) -> FileSystem {
    let mut fs = FileSystem::new();
    fs.mount(disk).unwrap();
    fs
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn free_blocks(fs: &FileSystem) -> usize {
    fs.info().unwrap().free_data_blocks
}

/// 可以让写入失败的设备
#[derive(Debug)]
pub struct FlakyDisk {
    inner: RamDisk,
    /// 还允许成功的写入次数
    writes_left: AtomicUsize,
    fail_reads: AtomicBool,
}

impl FlakyDisk {
    pub fn formatted(blocks: usize) -> Arc<Self> {
        let inner = RamDisk::new(blocks);
        FileSystem::format(&inner).unwrap();
        Arc::new(Self {
            inner,
            writes_left: AtomicUsize::new(usize::MAX),
            fail_reads: AtomicBool::new(false),
        })
    }

    pub fn allow_writes(&self, n: usize) {
        self.writes_left.store(n, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.writes_left.store(usize::MAX, Ordering::SeqCst);
        self.fail_reads.store(false, Ordering::SeqCst);
    }

    pub fn break_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

impl BlockDevice for FlakyDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::Io);
        }
        self.inner.read_block(block_id, buf)
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let left = self.writes_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(DeviceError::Io);
        }
        if left != usize::MAX {
            self.writes_left.store(left - 1, Ordering::SeqCst);
        }
        self.inner.write_block(block_id, buf)
    }

    fn num_blocks(&self) -> usize {
        self.inner.num_blocks()
    }
}

pub fn fat_region(image: &[u8], fat_blocks: usize) -> &[u8] {
    &image[BLOCK_SIZE..(1 + fat_blocks) * BLOCK_SIZE]
}
