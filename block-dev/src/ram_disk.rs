use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{BLOCK_SIZE, BlockDevice, DeviceError, check_access};

/// 内存中的块设备
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    num_blocks: usize,
}

impl RamDisk {
    /// 创建一个全零的设备
    pub fn new(num_blocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; num_blocks * BLOCK_SIZE]),
            num_blocks,
        }
    }

    /// 从原始镜像创建，末尾不足一块的字节被丢弃
    pub fn from_image(mut image: Vec<u8>) -> Self {
        let num_blocks = image.len() / BLOCK_SIZE;
        image.truncate(num_blocks * BLOCK_SIZE);
        Self {
            data: Mutex::new(image),
            num_blocks,
        }
    }

    /// 当前内容的拷贝
    pub fn image(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        check_access(block_id, buf.len(), self.num_blocks)?;
        let start = block_id * BLOCK_SIZE;
        buf.copy_from_slice(&self.data.lock()[start..start + BLOCK_SIZE]);
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        check_access(block_id, buf.len(), self.num_blocks)?;
        let start = block_id * BLOCK_SIZE;
        self.data.lock()[start..start + BLOCK_SIZE].copy_from_slice(buf);
        Ok(())
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}
