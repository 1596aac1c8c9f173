//! # 卷
//!
//! 卷的布局：
//! 超级块 | FAT区 | 根目录 | 数据区
//!
//! 挂载后超级块、FAT与根目录都在内存中保有一份镜像，
//! 数据块则每次读写都直接访问设备。

mod fat;
mod root_dir;
mod super_block;

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::{BLOCK_SIZE, BlockDevice};
use zerocopy::IntoBytes;

pub use self::{
    fat::{FAT_ENTRIES_PER_BLOCK, Fat},
    root_dir::{DirEntry, RootDir, check_name},
    super_block::SuperBlock,
};
use crate::control::{FileInfo, Info};
use crate::file::FileTable;
use crate::{BlockId, Error, Fd, Result};

/// 已挂载的卷
#[derive(Debug)]
pub(crate) struct Volume {
    pub(crate) dev: Arc<dyn BlockDevice>,
    pub(crate) super_block: SuperBlock,
    pub(crate) fat: Fat,
    pub(crate) root: RootDir,
    pub(crate) files: FileTable,
}

impl Volume {
    /// 在设备上建立一个空卷
    pub fn format(dev: &dyn BlockDevice) -> Result<()> {
        let super_block = SuperBlock::new(dev.num_blocks())?;
        dev.write_block(0, super_block.as_bytes())?;
        Fat::new(super_block.data_blocks()).store(dev, &super_block)?;
        RootDir::new().store(dev, super_block.root_dir_block())?;

        log::info!(
            "formatted: {} blocks, {} FAT blocks, {} data blocks",
            super_block.total_blocks(),
            super_block.fat_blocks(),
            super_block.data_blocks()
        );
        Ok(())
    }

    pub fn mount(dev: Arc<dyn BlockDevice>) -> Result<Self> {
        let mut buf = [0u8; BLOCK_SIZE];
        dev.read_block(0, &mut buf)?;
        let super_block: SuperBlock = zerocopy::transmute!(buf);
        super_block.validate(dev.num_blocks())?;

        let fat = Fat::load(&*dev, &super_block)?;
        let root = RootDir::load(&*dev, super_block.root_dir_block())?;
        // 起始块必须落在数据区内，否则沿链表读写会越界
        let out_of_range = |id: BlockId| id != BlockId::EOC && !fat.contains(id);
        if let Some((slot, entry)) = root
            .iter()
            .find(|(_, entry)| out_of_range(entry.first_block()))
        {
            log::warn!(
                "slot {slot}: {:?} starts at block {} outside the data area",
                entry.name_lossy(),
                entry.first_block()
            );
            return Err(Error::InvalidLayout);
        }
        log::info!(
            "mounted: {} blocks, {} of {} data blocks free",
            super_block.total_blocks(),
            fat.free_count(),
            super_block.data_blocks()
        );

        Ok(Self {
            dev,
            super_block,
            fat,
            root,
            files: FileTable::new(),
        })
    }

    /// 把修改过的FAT与根目录写回设备
    pub fn sync(&mut self) -> Result<()> {
        self.fat.store(&*self.dev, &self.super_block)?;
        self.root
            .store(&*self.dev, self.super_block.root_dir_block())?;
        Ok(())
    }

    /// 写回元数据并关闭设备。
    /// 仍有打开的文件时拒绝卸载；写回失败时设备保持打开。
    pub fn unmount(&mut self) -> Result<()> {
        let open = self.files.open_count();
        if open > 0 {
            log::warn!("unmount refused: {open} files still open");
            return Err(Error::FilesOpen);
        }
        self.sync()?;
        self.dev.close()?;
        log::info!("unmounted");
        Ok(())
    }

    pub fn info(&self) -> Info {
        let sb = &self.super_block;
        Info {
            total_blocks: sb.total_blocks(),
            fat_blocks: sb.fat_blocks(),
            root_dir_block: sb.root_dir_block(),
            data_start: sb.data_start(),
            data_blocks: sb.data_blocks(),
            free_data_blocks: self.fat.free_count(),
            free_dir_entries: self.root.free_count(),
            dir_entries: self.root.capacity(),
        }
    }

    pub fn create(&mut self, name: &str) -> Result<()> {
        let name = check_name(name)?;
        let slot = self.root.create(name)?;
        log::debug!("create {:?} in slot {slot}", self.root.get(slot).name_lossy());
        Ok(())
    }

    /// 删除文件并释放它的整个块链表
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let name = check_name(name)?;
        let slot = self.root.find(name).ok_or(Error::NotFound)?;
        if self.files.is_open(slot) {
            return Err(Error::FileInUse);
        }

        let entry = self.root.remove(slot);
        let released = self.fat.release(entry.first_block());
        log::debug!(
            "delete {:?}: {} bytes, {released} blocks",
            entry.name_lossy(),
            entry.size()
        );
        Ok(())
    }

    pub fn list(&self) -> Vec<FileInfo> {
        self.root
            .iter()
            .map(|(_, entry)| FileInfo {
                name: entry.name_lossy().into_owned(),
                size: entry.size(),
                first_block: entry.first_block(),
            })
            .collect()
    }

    pub fn open(&mut self, name: &str) -> Result<Fd> {
        let name = check_name(name)?;
        let slot = self.root.find(name).ok_or(Error::NotFound)?;
        let fd = self.files.open(slot, self.root.get(slot).first_block())?;
        log::debug!("open {:?} as fd {fd}", self.root.get(slot).name_lossy());
        Ok(fd)
    }

    pub fn close(&mut self, fd: Fd) -> Result<()> {
        self.files.close(fd)?;
        log::debug!("close fd {fd}");
        Ok(())
    }

    pub fn stat(&self, fd: Fd) -> Result<usize> {
        let file = self.files.get(fd)?;
        Ok(self.root.get(file.slot).size())
    }

    /// 移动游标，不能越过文件末尾
    pub fn seek(&mut self, fd: Fd, offset: usize) -> Result<()> {
        let file = self.files.get_mut(fd)?;
        let entry = self.root.get(file.slot);
        if offset > entry.size() {
            return Err(Error::OffsetOutOfRange {
                offset,
                size: entry.size(),
            });
        }
        file.seek(offset, &self.fat, entry.first_block());
        Ok(())
    }
}
