use core::ops::Range;

use zerocopy::little_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::volume::fat::FAT_ENTRIES_PER_BLOCK;
use crate::{BlockId, Error, Result, SIGNATURE};

/// 超级块：
/// - 提供卷的合法性校验；
/// - 定位其它连续区域
///
/// 位于0号块，剩余部分皆填0x00。
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct SuperBlock {
    /// 签名：用于校验卷的合法性
    signature: [u8; 8],
    /// 卷占据的块数
    total_blocks: U16,
    /// 根目录所在块
    root_dir_block: U16,
    /// 数据区的起始块
    data_start: U16,
    /// 数据区的块数，即FAT的条目数
    data_blocks: U16,
    /// FAT区的块数
    fat_blocks: u8,
    _padding: [u8; 4079],
}

impl SuperBlock {
    /// 为`total_blocks`块的设备规划布局：
    /// 超级块 | FAT区 | 根目录 | 数据区
    ///
    /// FAT区取能容纳全部数据块条目的最小块数。
    pub fn new(total_blocks: usize) -> Result<Self> {
        // 至少要有一个可分配的数据块
        if !(5..=u16::MAX as usize).contains(&total_blocks) {
            return Err(Error::InvalidGeometry {
                blocks: total_blocks,
            });
        }

        let fat_blocks = (total_blocks - 2).div_ceil(FAT_ENTRIES_PER_BLOCK + 1);
        let data_blocks = total_blocks - 2 - fat_blocks;
        debug_assert!(fat_blocks * FAT_ENTRIES_PER_BLOCK >= data_blocks);

        Ok(Self {
            signature: SIGNATURE,
            total_blocks: U16::new(total_blocks as u16),
            root_dir_block: U16::new(fat_blocks as u16 + 1),
            data_start: U16::new(fat_blocks as u16 + 2),
            data_blocks: U16::new(data_blocks as u16),
            fat_blocks: fat_blocks as u8,
            _padding: [0; 4079],
        })
    }

    /// 核对签名与设备大小，再确认各区域落在卷内
    pub fn validate(&self, device_blocks: usize) -> Result<()> {
        if self.signature != SIGNATURE {
            return Err(Error::SignatureMismatch);
        }
        if self.total_blocks() != device_blocks {
            return Err(Error::SizeMismatch {
                declared: self.total_blocks(),
                actual: device_blocks,
            });
        }

        let total = self.total_blocks();
        if self.fat_blocks == 0
            || self.fat_blocks() * FAT_ENTRIES_PER_BLOCK < self.data_blocks()
            || self.fat_area().end > total
            || self.root_dir_block() >= total
            || self.data_start() + self.data_blocks() > total
        {
            return Err(Error::InvalidLayout);
        }

        Ok(())
    }

    pub fn total_blocks(&self) -> usize {
        self.total_blocks.get() as usize
    }

    pub fn fat_blocks(&self) -> usize {
        self.fat_blocks as usize
    }

    pub fn root_dir_block(&self) -> usize {
        self.root_dir_block.get() as usize
    }

    pub fn data_start(&self) -> usize {
        self.data_start.get() as usize
    }

    pub fn data_blocks(&self) -> usize {
        self.data_blocks.get() as usize
    }

    /// FAT区占据的块
    pub fn fat_area(&self) -> Range<usize> {
        1..1 + self.fat_blocks()
    }

    /// 数据块编号对应的设备块号
    pub fn data_block(&self, id: BlockId) -> usize {
        self.data_start() + usize::from(id)
    }
}
