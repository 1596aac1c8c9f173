//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、镜像文件等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过块设备驱动访问卷，不关心它背后是内存还是宿主机文件。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;
use core::fmt::Debug;

use derive_more::Display;

pub use self::ram_disk::RamDisk;

/// 一个块的字节量，整个卷统一
pub const BLOCK_SIZE: usize = 4096;

/// 块设备驱动特质
///
/// 每次读写恰好一个块，`buf`的长度必须为[`BLOCK_SIZE`]。
pub trait BlockDevice: Send + Sync + Any + Debug {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError>;

    /// 设备的总块数
    fn num_blocks(&self) -> usize;

    /// 释放设备，之前写入的数据须已落盘
    fn close(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DeviceError {
    #[display(fmt = "block {} is out of range ({} blocks)", block_id, num_blocks)]
    OutOfRange { block_id: usize, num_blocks: usize },
    #[display(fmt = "buffer of {} bytes is not a block", _0)]
    BadBuffer(usize),
    #[display(fmt = "I/O error on the backing store")]
    Io,
}

impl core::error::Error for DeviceError {}

/// 检查块号与缓冲区，供各驱动复用
pub fn check_access(block_id: usize, buf_len: usize, num_blocks: usize) -> Result<(), DeviceError> {
    if block_id >= num_blocks {
        return Err(DeviceError::OutOfRange {
            block_id,
            num_blocks,
        });
    }
    if buf_len != BLOCK_SIZE {
        return Err(DeviceError::BadBuffer(buf_len));
    }
    Ok(())
}
