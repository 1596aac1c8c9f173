//! 命令行各子命令的实现，每条命令挂载一次镜像，结束时卸载。

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tinyfat::FileSystem;
use tinyfat::volume::{FAT_ENTRIES_PER_BLOCK, SuperBlock};

use crate::BlockFile;

/// 命令失败时也会卸载，命令失败前做出的修改照样写回
pub(crate) fn with_volume<T>(
    disk: &Path,
    f: impl FnOnce(&mut FileSystem) -> tinyfat::Result<T>,
) -> io::Result<T> {
    let dev = Arc::new(BlockFile::open(disk)?);
    let mut fs = FileSystem::new();
    fs.mount(dev).map_err(io::Error::other)?;
    let ret = f(&mut fs);
    if let Err(err) = fs.unmount() {
        if ret.is_ok() {
            return Err(io::Error::other(err));
        }
        log::warn!("unmount after a failed command: {err}");
    }
    ret.map_err(io::Error::other)
}

/// 新建含`data_blocks`个数据块的镜像
pub fn make(disk: &Path, data_blocks: usize) -> io::Result<()> {
    let fat_blocks = data_blocks.div_ceil(FAT_ENTRIES_PER_BLOCK);
    let total_blocks = data_blocks + fat_blocks + 2;
    // 先核对布局，免得留下没格式化的镜像
    SuperBlock::new(total_blocks)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let dev = BlockFile::create(disk, total_blocks)?;
    FileSystem::format(&dev).map_err(io::Error::other)?;
    log::info!("created {disk:?} with {data_blocks} data blocks");
    Ok(())
}

pub fn info(disk: &Path, out: &mut impl Write) -> io::Result<()> {
    let info = with_volume(disk, |fs| fs.info())?;
    writeln!(out, "{info}")
}

pub fn ls(disk: &Path, out: &mut impl Write) -> io::Result<()> {
    let files = with_volume(disk, |fs| fs.list())?;
    writeln!(out, "FS Ls:")?;
    for file in files {
        writeln!(out, "{file}")?;
    }
    Ok(())
}

/// 把宿主机文件拷入镜像，文件名沿用宿主机上的名字
pub fn add(disk: &Path, host_file: &Path) -> io::Result<usize> {
    let name = host_file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad host file name"))?;
    let data = fs::read(host_file)?;

    let written = with_volume(disk, |fs| {
        fs.create(name)?;
        let fd = fs.open(name)?;
        let written = fs.write(fd, &data);
        fs.close(fd)?;
        written
    })?;
    if written < data.len() {
        return Err(io::Error::new(
            io::ErrorKind::StorageFull,
            format!("only {written} of {} bytes fit", data.len()),
        ));
    }
    Ok(written)
}

pub fn rm(disk: &Path, name: &str) -> io::Result<()> {
    with_volume(disk, |fs| fs.delete(name))
}

pub fn cat(disk: &Path, name: &str, out: &mut impl Write) -> io::Result<()> {
    let data = with_volume(disk, |fs| {
        let fd = fs.open(name)?;
        let mut data = vec![0; fs.stat(fd)?];
        let read = fs.read(fd, &mut data);
        fs.close(fd)?;
        data.truncate(read?);
        Ok(data)
    })?;
    out.write_all(&data)
}

pub fn stat(disk: &Path, name: &str, out: &mut impl Write) -> io::Result<()> {
    let size = with_volume(disk, |fs| {
        let fd = fs.open(name)?;
        let size = fs.stat(fd);
        fs.close(fd)?;
        size
    })?;
    writeln!(out, "Size of file '{name}' is {size} bytes")
}
