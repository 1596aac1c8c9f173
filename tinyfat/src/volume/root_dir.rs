//! 根目录：定长的目录项数组，整张表占据一个块。

use alloc::borrow::Cow;
use alloc::string::String;

use block_dev::{BLOCK_SIZE, BlockDevice, DeviceError};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::{BlockId, Error, FILE_MAX_COUNT, FILENAME_LEN, Result};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct DirEntry {
    /// NUL结尾，首字节为NUL表示空槽
    name: [u8; FILENAME_LEN],
    /// 文件字节数
    size: U32,
    /// 块链表的起始块，空文件为[`BlockId::EOC`]
    first_block: U16,
    _padding: [u8; 10],
}

impl DirEntry {
    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    /// 文件名的有效部分，不含NUL
    pub fn name(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_LEN);
        &self.name[..len]
    }

    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name())
    }

    pub fn size(&self) -> usize {
        self.size.get() as usize
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = U32::new(size as u32);
    }

    pub fn first_block(&self) -> BlockId {
        BlockId::new(self.first_block.get())
    }

    pub fn set_first_block(&mut self, id: BlockId) {
        self.first_block = U16::new(id.into());
    }

    fn init(&mut self, name: &[u8]) {
        *self = Self::new_zeroed();
        self.name[..name.len()].copy_from_slice(name);
        self.set_first_block(BlockId::EOC);
    }
}

/// 检查文件名：非空，且连同结尾的NUL能放进文件名缓冲区
pub fn check_name(name: &str) -> Result<&[u8]> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() >= FILENAME_LEN || bytes.contains(&0) {
        return Err(Error::InvalidName);
    }
    Ok(bytes)
}

#[derive(Debug)]
pub struct RootDir {
    entries: [DirEntry; FILE_MAX_COUNT],
    dirty: bool,
}

impl RootDir {
    pub fn new() -> Self {
        Self {
            entries: [DirEntry::new_zeroed(); FILE_MAX_COUNT],
            dirty: true,
        }
    }

    pub fn load(dev: &dyn BlockDevice, block_id: usize) -> Result<Self, DeviceError> {
        let mut buf = [0u8; BLOCK_SIZE];
        dev.read_block(block_id, &mut buf)?;
        let entries: [DirEntry; FILE_MAX_COUNT] = zerocopy::transmute!(buf);
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    /// 写回根目录块，未修改时什么也不做
    pub fn store(&mut self, dev: &dyn BlockDevice, block_id: usize) -> Result<(), DeviceError> {
        if self.dirty {
            dev.write_block(block_id, self.entries.as_bytes())?;
            log::debug!("root directory written back");
            self.dirty = false;
        }
        Ok(())
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 按槽位顺序查找同名文件
    pub fn find(&self, name: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| !entry.is_free() && entry.name() == name)
    }

    /// 在第一个空槽上创建空文件，返回槽位
    pub fn create(&mut self, name: &[u8]) -> Result<usize> {
        if self.find(name).is_some() {
            return Err(Error::AlreadyExists);
        }
        let slot = self
            .entries
            .iter()
            .position(DirEntry::is_free)
            .ok_or(Error::DirectoryFull)?;

        self.entries[slot].init(name);
        self.dirty = true;
        Ok(slot)
    }

    /// 清空槽位，返回原来的目录项
    pub fn remove(&mut self, slot: usize) -> DirEntry {
        let entry = self.entries[slot];
        self.entries[slot].name[0] = 0;
        self.dirty = true;
        entry
    }

    pub fn get(&self, slot: usize) -> &DirEntry {
        &self.entries[slot]
    }

    /// 修改目录项，根目录随之变脏
    pub fn get_mut(&mut self, slot: usize) -> &mut DirEntry {
        self.dirty = true;
        &mut self.entries[slot]
    }

    /// 非空的目录项及其槽位
    pub fn iter(&self) -> impl Iterator<Item = (usize, &DirEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_free())
    }

    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_free()).count()
    }

    pub const fn capacity(&self) -> usize {
        FILE_MAX_COUNT
    }
}
