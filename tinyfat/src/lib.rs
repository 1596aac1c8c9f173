#![no_std]

extern crate alloc;

/* tinyfat 的整体架构，自上而下 */

// 挂载状态与对外接口
mod control;

// 读写引擎：字节区间与块链之间的转换
mod io;

// 打开文件表
mod file;

// 卷：磁盘布局与内存中的元数据镜像
pub mod volume;

// 数据块编号
mod block;

mod error;

pub use block_dev::{BLOCK_SIZE, BlockDevice, DeviceError};

pub use self::{
    block::BlockId,
    control::{FileInfo, FileSystem, Info},
    error::{Error, Result},
    file::Fd,
};

/// 超级块签名
pub const SIGNATURE: [u8; 8] = *b"ECS150FS";
/// 文件名缓冲区长度，含结尾的NUL
pub const FILENAME_LEN: usize = 16;
/// 根目录容量
pub const FILE_MAX_COUNT: usize = 128;
/// 同时打开的文件描述符上限
pub const OPEN_MAX_COUNT: usize = 32;
