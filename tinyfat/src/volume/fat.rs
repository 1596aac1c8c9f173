//! 文件分配表
//!
//! 每个数据块对应一个16位条目，条目之间以下标相连，构成文件的块链表。
//! 挂载期间整张表常驻内存，卸载时若被修改过才写回FAT区。

use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use block_dev::{BLOCK_SIZE, BlockDevice, DeviceError};
use zerocopy::IntoBytes;
use zerocopy::little_endian::U16;

use crate::BlockId;
use crate::volume::SuperBlock;

/// 一个块能容纳多少条FAT条目
pub const FAT_ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / mem::size_of::<U16>();

#[derive(Debug)]
pub struct Fat {
    entries: Vec<BlockId>,
    /// 自上次同步后是否被修改
    dirty: bool,
}

impl Fat {
    /// 全新的表，`0`号条目被保留
    pub fn new(data_blocks: usize) -> Self {
        let mut entries = vec![BlockId::FREE; data_blocks];
        if let Some(reserved) = entries.first_mut() {
            *reserved = BlockId::EOC;
        }
        Self {
            entries,
            dirty: true,
        }
    }

    pub fn load(dev: &dyn BlockDevice, sb: &SuperBlock) -> Result<Self, DeviceError> {
        let mut entries = Vec::with_capacity(sb.fat_blocks() * FAT_ENTRIES_PER_BLOCK);
        let mut buf = [0u8; BLOCK_SIZE];
        for block_id in sb.fat_area() {
            dev.read_block(block_id, &mut buf)?;
            let slots: [U16; FAT_ENTRIES_PER_BLOCK] = zerocopy::transmute!(buf);
            entries.extend(slots.iter().map(|slot| BlockId::new(slot.get())));
        }
        entries.truncate(sb.data_blocks());

        Ok(Self {
            entries,
            dirty: false,
        })
    }

    /// 写回FAT区，未修改时什么也不做
    pub fn store(&mut self, dev: &dyn BlockDevice, sb: &SuperBlock) -> Result<(), DeviceError> {
        if !self.dirty {
            return Ok(());
        }

        let mut chunks = self.entries.chunks(FAT_ENTRIES_PER_BLOCK);
        for block_id in sb.fat_area() {
            let mut slots = [U16::ZERO; FAT_ENTRIES_PER_BLOCK];
            for (slot, &entry) in slots.iter_mut().zip(chunks.next().unwrap_or_default()) {
                *slot = U16::new(entry.into());
            }
            dev.write_block(block_id, slots.as_bytes())?;
        }
        log::debug!("FAT written back ({} blocks)", sb.fat_blocks());

        self.dirty = false;
        Ok(())
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 获取下一个块编号。
    /// `None`表示`id`为链表上最后一个块，
    /// 指向空闲块或越界的条目也当作链表结束。
    pub fn next(&self, id: BlockId) -> Option<BlockId> {
        match *self.entries.get(usize::from(id))? {
            BlockId::EOC => None,
            BlockId::FREE => {
                log::warn!("block {id} is chained but marked free");
                None
            }
            next if usize::from(next) < self.entries.len() => Some(next),
            next => {
                log::warn!("block {id} points past the data area: {next}");
                None
            }
        }
    }

    /// 从`1`号条目开始，寻找第一个未分配的块。
    pub fn find_free(&self) -> Option<BlockId> {
        self.entries
            .iter()
            .enumerate()
            .skip(BlockId::MIN.into())
            .find_map(|(i, &entry)| (entry == BlockId::FREE).then(|| BlockId::new(i as u16)))
    }

    /// 分配一个块并标记为链表末尾。
    pub fn alloc(&mut self) -> Option<BlockId> {
        let id = self.find_free()?;
        self.entries[usize::from(id)] = BlockId::EOC;
        self.dirty = true;
        log::debug!("alloc block {id}");
        Some(id)
    }

    /// 是否为可分配的块编号，即可以出现在链表上
    pub fn contains(&self, id: BlockId) -> bool {
        (usize::from(BlockId::MIN)..self.entries.len()).contains(&usize::from(id))
    }

    /// 把`next`接在`prev`之后
    pub fn link(&mut self, prev: BlockId, next: BlockId) {
        let Some(entry) = self.entries.get_mut(usize::from(prev)) else {
            log::warn!("cannot link block {prev} past the data area to {next}");
            return;
        };
        *entry = next;
        self.dirty = true;
    }

    /// 释放整个块链表，返回释放的块数。
    ///
    /// `start`为[`BlockId::EOC`]时链表为空，什么也不释放。
    pub fn release(&mut self, start: BlockId) -> usize {
        let mut id = start;
        let mut released = 0;

        // 条目数是链长的上限，损坏的环状链表也能终止
        while id != BlockId::EOC && id != BlockId::FREE && released < self.entries.len() {
            let Some(entry) = self.entries.get_mut(usize::from(id)) else {
                break;
            };
            if *entry == BlockId::FREE {
                log::warn!("block {id} released twice");
                break;
            }
            id = mem::replace(entry, BlockId::FREE);
            released += 1;
        }

        if released > 0 {
            self.dirty = true;
        }
        log::debug!("released {released} blocks from {start}");
        released
    }

    /// 空闲块数量，不含保留的`0`号条目
    pub fn free_count(&self) -> usize {
        self.entries
            .iter()
            .skip(BlockId::MIN.into())
            .filter(|&&entry| entry == BlockId::FREE)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
