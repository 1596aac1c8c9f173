//! # 读写引擎
//!
//! 把描述符上的字节区间翻译成沿块链表的逐块读写。
//! 只有写入恰好越过块边界、且后面没有块时才分配新块。

use block_dev::{BLOCK_SIZE, DeviceError};

use crate::volume::Volume;
use crate::{BlockId, Fd, Result};

impl Volume {
    /// 从游标处读取，最多读满`buf`，遇到文件末尾或链表结束就提前返回。
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let file = self.files.get_mut(fd)?;
        let entry = self.root.get(file.slot);
        let first = entry.first_block();
        let end = entry.size().min(file.offset.saturating_add(buf.len()));

        let mut data = [0u8; BLOCK_SIZE];
        let mut read_size = 0;
        while file.offset < end {
            let Some(block) = file.resolve(&self.fat, first) else {
                log::warn!(
                    "fd {fd}: chain ends at offset {} before size {}",
                    file.offset,
                    entry.size()
                );
                break;
            };

            let block_id = self.super_block.data_block(block);
            if let Err(err) = self.dev.read_block(block_id, &mut data) {
                return partial(read_size, err);
            }
            log::trace!("fd {fd}: read block {block} (#{block_id})");

            let start = file.in_block();
            let block_read_size = (BLOCK_SIZE - start).min(end - file.offset);
            buf[read_size..read_size + block_read_size]
                .copy_from_slice(&data[start..start + block_read_size]);
            read_size += block_read_size;
            file.advance(block_read_size, &self.fat);
        }

        Ok(read_size)
    }

    /// 从游标处写入，必要时分配新块；文件大小只增不减。
    ///
    /// 卷写满时返回已写入的字节数，这不是错误。
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let file = self.files.get_mut(fd)?;
        let slot = file.slot;

        let mut data = [0u8; BLOCK_SIZE];
        let mut wrote_size = 0;
        while wrote_size < buf.len() {
            let start = file.in_block();
            let block_write_size = (BLOCK_SIZE - start).min(buf.len() - wrote_size);

            // 本轮新分配的块接在哪个块之后，首块为EOC
            let mut appended_to = None;
            let first = self.root.get(slot).first_block();
            let block = match file.resolve(&self.fat, first) {
                Some(block) => {
                    // 整块覆盖时不必先读出旧内容
                    if block_write_size < BLOCK_SIZE {
                        let block_id = self.super_block.data_block(block);
                        if let Err(err) = self.dev.read_block(block_id, &mut data) {
                            return partial(wrote_size, err);
                        }
                    }
                    block
                }
                None => {
                    let Some(block) = self.fat.alloc() else {
                        log::warn!("fd {fd}: volume full after {wrote_size} bytes");
                        break;
                    };
                    if file.block == BlockId::EOC {
                        self.root.get_mut(slot).set_first_block(block);
                    } else {
                        self.fat.link(file.block, block);
                    }
                    appended_to = Some(file.block);
                    file.block = block;
                    file.pending = false;
                    data.fill(0);
                    block
                }
            };

            data[start..start + block_write_size]
                .copy_from_slice(&buf[wrote_size..wrote_size + block_write_size]);
            let block_id = self.super_block.data_block(block);
            if let Err(err) = self.dev.write_block(block_id, &data) {
                // 新块没写成，从链表上摘下并归还
                if let Some(prev) = appended_to {
                    if prev == BlockId::EOC {
                        self.root.get_mut(slot).set_first_block(BlockId::EOC);
                    } else {
                        self.fat.link(prev, BlockId::EOC);
                    }
                    self.fat.release(block);
                    file.block = prev;
                    file.pending = prev != BlockId::EOC;
                }
                return partial(wrote_size, err);
            }
            log::trace!("fd {fd}: wrote block {block} (#{block_id})");

            wrote_size += block_write_size;
            file.advance(block_write_size, &self.fat);

            let entry = self.root.get_mut(slot);
            if file.offset > entry.size() {
                entry.set_size(file.offset);
            }
        }

        Ok(wrote_size)
    }
}

/// 已经传输过数据时，设备错误只让本次调用提前结束
fn partial(done: usize, err: DeviceError) -> Result<usize> {
    if done == 0 {
        return Err(err.into());
    }
    log::warn!("transfer stopped after {done} bytes: {err}");
    Ok(done)
}
