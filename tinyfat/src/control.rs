use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use block_dev::BlockDevice;

use crate::volume::Volume;
use crate::{BlockId, Error, Fd, Result};

/// 文件系统的上下文：同一时刻至多挂载一个卷。
///
/// 除了[`FileSystem::format`]，所有操作在未挂载时都返回[`Error::NotMounted`]。
/// 内部没有锁，多线程共享时需由调用者用一把锁保护整个文件系统。
#[derive(Debug, Default)]
pub struct FileSystem {
    volume: Option<Volume>,
}

/// 卷的概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Info {
    pub total_blocks: usize,
    pub fat_blocks: usize,
    pub root_dir_block: usize,
    pub data_start: usize,
    pub data_blocks: usize,
    /// 空闲数据块，不含保留的`0`号块
    pub free_data_blocks: usize,
    pub free_dir_entries: usize,
    pub dir_entries: usize,
}

/// 根目录中的一个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: usize,
    pub first_block: BlockId,
}

impl FileSystem {
    pub const fn new() -> Self {
        Self { volume: None }
    }

    /// 在设备上建立空卷，原有内容全部作废
    pub fn format(dev: &dyn BlockDevice) -> Result<()> {
        Volume::format(dev)
    }

    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    pub fn mount(&mut self, dev: Arc<dyn BlockDevice>) -> Result<()> {
        if self.volume.is_some() {
            return Err(Error::AlreadyMounted);
        }
        self.volume = Some(Volume::mount(dev)?);
        Ok(())
    }

    /// 所有文件都关闭后才能卸载，卸载失败时卷保持挂载
    pub fn unmount(&mut self) -> Result<()> {
        self.volume_mut()?.unmount()?;
        self.volume = None;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.volume_mut()?.sync()
    }

    pub fn info(&self) -> Result<Info> {
        Ok(self.volume()?.info())
    }

    pub fn create(&mut self, name: &str) -> Result<()> {
        self.volume_mut()?.create(name)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.volume_mut()?.delete(name)
    }

    pub fn list(&self) -> Result<Vec<FileInfo>> {
        Ok(self.volume()?.list())
    }

    pub fn open(&mut self, name: &str) -> Result<Fd> {
        self.volume_mut()?.open(name)
    }

    pub fn close(&mut self, fd: Fd) -> Result<()> {
        self.volume_mut()?.close(fd)
    }

    /// 文件当前的字节数
    pub fn stat(&self, fd: Fd) -> Result<usize> {
        self.volume()?.stat(fd)
    }

    pub fn seek(&mut self, fd: Fd, offset: usize) -> Result<()> {
        self.volume_mut()?.seek(fd, offset)
    }

    /// 返回实际读取的字节数，到达文件末尾时为0
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        self.volume_mut()?.read(fd, buf)
    }

    /// 返回实际写入的字节数，卷满时可能少于`buf.len()`
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        self.volume_mut()?.write(fd, buf)
    }
}

impl FileSystem {
    fn volume(&self) -> Result<&Volume> {
        self.volume.as_ref().ok_or(Error::NotMounted)
    }

    fn volume_mut(&mut self) -> Result<&mut Volume> {
        self.volume.as_mut().ok_or(Error::NotMounted)
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(f, "fat_free_ratio={}/{}", self.free_data_blocks, self.data_blocks)?;
        write!(f, "rdir_free_ratio={}/{}", self.free_dir_entries, self.dir_entries)
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, size: {}, data_blk: {}",
            self.name, self.size, self.first_block
        )
    }
}
