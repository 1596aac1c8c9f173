use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use block_dev::{BLOCK_SIZE, BlockDevice, DeviceError, check_access};
use send_wrapper::SendWrapper;

/// 以宿主机上的镜像文件作为块设备
#[derive(Debug)]
pub struct BlockFile {
    inner: SendWrapper<RefCell<File>>,
    num_blocks: usize,
}

impl BlockFile {
    /// 打开已有的镜像，不足一块的尾部被忽略
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let fd = OpenOptions::new().read(true).write(true).open(path)?;
        let num_blocks = fd.metadata()?.len() as usize / BLOCK_SIZE;
        Ok(Self::new(fd, num_blocks))
    }

    /// 新建一个`num_blocks`块、内容全零的镜像
    pub fn create(path: impl AsRef<Path>, num_blocks: usize) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len((num_blocks * BLOCK_SIZE) as u64)?;
        Ok(Self::new(fd, num_blocks))
    }

    fn new(fd: File, num_blocks: usize) -> Self {
        Self {
            inner: SendWrapper::new(RefCell::new(fd)),
            num_blocks,
        }
    }
}

fn io_error(block_id: usize, err: io::Error) -> DeviceError {
    log::error!("block {block_id}: {err}");
    DeviceError::Io
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        check_access(block_id, buf.len(), self.num_blocks)?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .and_then(|_| file.read_exact(buf))
            .map_err(|err| io_error(block_id, err))
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> Result<(), DeviceError> {
        check_access(block_id, buf.len(), self.num_blocks)?;
        let mut file = self.inner.borrow_mut();
        file.seek(SeekFrom::Start((block_id * BLOCK_SIZE) as u64))
            .and_then(|_| file.write_all(buf))
            .map_err(|err| io_error(block_id, err))
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn close(&self) -> Result<(), DeviceError> {
        let mut file = self.inner.borrow_mut();
        file.flush()
            .and_then(|_| file.sync_all())
            .map_err(|err| {
                log::error!("sync image: {err}");
                DeviceError::Io
            })
    }
}
