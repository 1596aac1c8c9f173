use derive_more::{Display, From, Into};

/// 数据块编号，也是FAT的下标。
///
/// FAT条目存放着链表中下一个块的编号，
/// 其中`0`表示块未分配，`0xFFFF`表示链表末尾，
/// 所以`0`号数据块永不分配，可用的块编号从`1`开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[repr(transparent)]
pub struct BlockId(u16);

impl BlockId {
    pub const FREE: Self = Self(0);

    /// 最小的可用块编号
    pub const MIN: Self = Self(1);

    /// 链表结束标记，空文件的起始块也是它
    pub const EOC: Self = Self(0xFFFF);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<BlockId> for usize {
    fn from(id: BlockId) -> Self {
        id.0 as usize
    }
}
