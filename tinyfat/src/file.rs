//! 打开文件表
//!
//! 描述符只存在于内存中，记录游标位置以及游标所在的块，
//! 免得每次读写都从链表头部走起。

use derive_more::{Display, From, Into};

use crate::{BLOCK_SIZE, BlockId, Error, OPEN_MAX_COUNT, Result};
use crate::volume::Fat;

/// 文件描述符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct Fd(usize);

#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    /// 根目录槽位
    pub slot: usize,
    /// 字节偏移
    pub offset: usize,
    /// 覆盖`offset`的块；文件尚无块时为[`BlockId::EOC`]
    pub block: BlockId,
    /// 游标恰好落在`block`之后的块边界上，而其后还没有块。
    /// 此时再写入必须分配新块，不能覆盖已写满的`block`。
    pub pending: bool,
}

impl Cursor {
    fn new(slot: usize, first: BlockId) -> Self {
        Self {
            slot,
            offset: 0,
            block: first,
            pending: false,
        }
    }

    #[inline]
    pub fn in_block(&self) -> usize {
        self.offset % BLOCK_SIZE
    }

    /// 返回覆盖游标的块，必要时沿链表前进一步。
    /// `None`表示该位置还没有分配块。
    ///
    /// 同一文件可能被多次打开，别的描述符可能已经在链表末尾追加了块，
    /// 所以每次都以FAT为准。
    pub fn resolve(&mut self, fat: &Fat, first: BlockId) -> Option<BlockId> {
        if self.block == BlockId::EOC {
            // 打开时文件为空
            if first == BlockId::EOC {
                return None;
            }
            self.block = first;
            self.pending = false;
        } else if self.pending {
            self.block = fat.next(self.block)?;
            self.pending = false;
        }
        Some(self.block)
    }

    /// 游标前进`n`个字节，`n`不会越过当前块的末尾。
    /// 到达块边界时移到下一块，没有下一块就挂起。
    pub fn advance(&mut self, n: usize, fat: &Fat) {
        debug_assert!(self.in_block() + n <= BLOCK_SIZE);
        self.offset += n;
        if n > 0 && self.in_block() == 0 {
            match fat.next(self.block) {
                Some(next) => self.block = next,
                None => self.pending = true,
            }
        }
    }

    /// 从`first`出发走到覆盖`offset`的块
    pub fn seek(&mut self, offset: usize, fat: &Fat, first: BlockId) {
        self.offset = offset;
        self.block = first;
        self.pending = false;
        if first == BlockId::EOC {
            return;
        }

        for _ in 0..offset / BLOCK_SIZE {
            match fat.next(self.block) {
                Some(next) => self.block = next,
                None => {
                    self.pending = true;
                    return;
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct FileTable {
    files: [Option<Cursor>; OPEN_MAX_COUNT],
}

impl FileTable {
    pub const fn new() -> Self {
        Self {
            files: [None; OPEN_MAX_COUNT],
        }
    }

    /// 占用第一个空闲描述符
    pub fn open(&mut self, slot: usize, first: BlockId) -> Result<Fd> {
        let (fd, file) = self
            .files
            .iter_mut()
            .enumerate()
            .find(|(_, file)| file.is_none())
            .ok_or(Error::TooManyOpenFiles)?;
        *file = Some(Cursor::new(slot, first));
        Ok(Fd(fd))
    }

    pub fn close(&mut self, fd: Fd) -> Result<Cursor> {
        self.files
            .get_mut(fd.0)
            .and_then(Option::take)
            .ok_or(Error::InvalidDescriptor)
    }

    pub fn get(&self, fd: Fd) -> Result<&Cursor> {
        self.files
            .get(fd.0)
            .and_then(Option::as_ref)
            .ok_or(Error::InvalidDescriptor)
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut Cursor> {
        self.files
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(Error::InvalidDescriptor)
    }

    /// 是否有描述符指向该槽位
    pub fn is_open(&self, slot: usize) -> bool {
        self.files.iter().flatten().any(|file| file.slot == slot)
    }

    pub fn open_count(&self) -> usize {
        self.files.iter().flatten().count()
    }
}
