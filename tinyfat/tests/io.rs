mod common;

use common::*;
use tinyfat::{BLOCK_SIZE, BlockId, Error, FileSystem};

fn write_file(fs: &mut FileSystem, name: &str, data: &[u8]) {
    fs.create(name).unwrap();
    let fd = fs.open(name).unwrap();
    assert_eq!(Ok(data.len()), fs.write(fd, data));
    fs.close(fd).unwrap();
}

fn read_file(fs: &mut FileSystem, name: &str) -> Vec<u8> {
    let fd = fs.open(name).unwrap();
    let mut buf = vec![0u8; fs.stat(fd).unwrap() + 16];
    let n = fs.read(fd, &mut buf).unwrap();
    fs.close(fd).unwrap();
    buf.truncate(n);
    buf
}

#[test]
fn round_trip() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    for len in [1, 100, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1, 3 * BLOCK_SIZE + 7] {
        let name = format!("len{len}");
        let data = pattern(len);
        write_file(&mut fs, &name, &data);
        assert_eq!(data, read_file(&mut fs, &name), "length {len}");
    }
}

#[test]
fn write_across_boundary_uses_two_blocks() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    let before = free_blocks(&fs);

    write_file(&mut fs, "f", &pattern(4100));
    assert_eq!(before - 2, free_blocks(&fs));

    let fd = fs.open("f").unwrap();
    assert_eq!(Ok(4100), fs.stat(fd));
}

#[test]
fn end_to_end() {
    let disk = formatted(DISK_BLOCKS);
    let mut fs = mount(disk.clone());

    fs.create("a.txt").unwrap();
    let fd = fs.open("a.txt").unwrap();
    assert_eq!(Ok(BLOCK_SIZE), fs.write(fd, &[b'a'; BLOCK_SIZE]));
    assert_eq!(Ok(4), fs.write(fd, b"bbbb"));
    fs.close(fd).unwrap();

    let fd = fs.open("a.txt").unwrap();
    fs.seek(fd, 0).unwrap();
    let mut buf = vec![0u8; 4100];
    assert_eq!(Ok(4100), fs.read(fd, &mut buf));
    assert!(buf[..BLOCK_SIZE].iter().all(|&b| b == b'a'));
    assert_eq!(b"bbbb", &buf[BLOCK_SIZE..]);
    assert_eq!(Ok(4100), fs.stat(fd));
    fs.close(fd).unwrap();
    fs.unmount().unwrap();

    // 重新挂载后内容不变
    let mut fs = mount(disk);
    let data = read_file(&mut fs, "a.txt");
    assert_eq!(4100, data.len());
    assert_eq!(b"bbbb", &data[BLOCK_SIZE..]);
}

#[test]
fn read_at_end_of_file() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", b"abc");

    let fd = fs.open("f").unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(Ok(3), fs.read(fd, &mut buf));
    assert_eq!(Ok(0), fs.read(fd, &mut buf));
    fs.seek(fd, 3).unwrap();
    assert_eq!(Ok(0), fs.read(fd, &mut buf));
}

#[test]
fn read_stops_at_size() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", &pattern(BLOCK_SIZE + 10));

    let fd = fs.open("f").unwrap();
    fs.seek(fd, BLOCK_SIZE - 5).unwrap();
    let mut buf = vec![0u8; 100];
    assert_eq!(Ok(15), fs.read(fd, &mut buf));
    assert_eq!(pattern(BLOCK_SIZE + 10)[BLOCK_SIZE - 5..], buf[..15]);
}

#[test]
fn read_in_pieces() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    let data = pattern(3 * BLOCK_SIZE);
    write_file(&mut fs, "f", &data);

    let fd = fs.open("f").unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 1000];
    loop {
        let n = fs.read(fd, &mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    assert_eq!(data, out);
}

#[test]
fn read_and_overwrite_at_offset() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", b"abcdefgh");

    let fd = fs.open("f").unwrap();
    fs.seek(fd, 2).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(Ok(4), fs.read(fd, &mut buf));
    assert_eq!(b"cdef", &buf);

    fs.seek(fd, 2).unwrap();
    assert_eq!(Ok(4), fs.write(fd, b"bbbb"));
    assert_eq!(Ok(8), fs.stat(fd));
    fs.close(fd).unwrap();
    assert_eq!(b"abbbbbgh".to_vec(), read_file(&mut fs, "f"));
}

#[test]
fn overwrite_across_boundary_keeps_size() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    let mut data = pattern(10000);
    write_file(&mut fs, "f", &data);
    let before = free_blocks(&fs);

    let fd = fs.open("f").unwrap();
    fs.seek(fd, 4000).unwrap();
    assert_eq!(Ok(200), fs.write(fd, &[b'x'; 200]));
    assert_eq!(Ok(10000), fs.stat(fd));
    fs.close(fd).unwrap();

    data[4000..4200].fill(b'x');
    assert_eq!(data, read_file(&mut fs, "f"));
    assert_eq!(before, free_blocks(&fs));
}

#[test]
fn overwrite_past_end_extends() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", &pattern(BLOCK_SIZE + 100));

    let fd = fs.open("f").unwrap();
    fs.seek(fd, BLOCK_SIZE).unwrap();
    assert_eq!(Ok(2 * BLOCK_SIZE), fs.write(fd, &[7; 2 * BLOCK_SIZE]));
    assert_eq!(Ok(3 * BLOCK_SIZE), fs.stat(fd));
    fs.close(fd).unwrap();

    let data = read_file(&mut fs, "f");
    assert_eq!(pattern(BLOCK_SIZE)[..], data[..BLOCK_SIZE]);
    assert!(data[BLOCK_SIZE..].iter().all(|&b| b == 7));
}

#[test]
fn append_after_full_block() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", &[1; BLOCK_SIZE]);
    let before = free_blocks(&fs);

    // 游标停在块边界上，下一次写入必须分配新块
    let fd = fs.open("f").unwrap();
    fs.seek(fd, BLOCK_SIZE).unwrap();
    assert_eq!(Ok(1), fs.write(fd, &[2]));
    assert_eq!(before - 1, free_blocks(&fs));
    fs.close(fd).unwrap();

    let data = read_file(&mut fs, "f");
    assert_eq!(BLOCK_SIZE + 1, data.len());
    assert!(data[..BLOCK_SIZE].iter().all(|&b| b == 1));
    assert_eq!(2, data[BLOCK_SIZE]);
}

#[test]
fn read_to_boundary_then_append() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    write_file(&mut fs, "f", &[1; 2 * BLOCK_SIZE]);

    let fd = fs.open("f").unwrap();
    let mut buf = vec![0u8; 2 * BLOCK_SIZE];
    assert_eq!(Ok(2 * BLOCK_SIZE), fs.read(fd, &mut buf));
    assert_eq!(Ok(3), fs.write(fd, b"end"));
    assert_eq!(Ok(2 * BLOCK_SIZE + 3), fs.stat(fd));
    fs.close(fd).unwrap();

    let data = read_file(&mut fs, "f");
    assert_eq!(b"end", &data[2 * BLOCK_SIZE..]);
}

#[test]
fn consecutive_writes_fill_blocks() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    let data = pattern(3 * BLOCK_SIZE);
    for chunk in data.chunks(1000) {
        assert_eq!(Ok(chunk.len()), fs.write(fd, chunk));
    }
    fs.close(fd).unwrap();

    assert_eq!(8191 - 3, free_blocks(&fs));
    assert_eq!(data, read_file(&mut fs, "f"));
}

#[test]
fn independent_cursors() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    fs.create("f").unwrap();
    let reader = fs.open("f").unwrap();
    let writer = fs.open("f").unwrap();

    let data = pattern(5000);
    assert_eq!(Ok(5000), fs.write(writer, &data));
    assert_eq!(Ok(5000), fs.stat(reader));

    let mut buf = vec![0u8; 6000];
    assert_eq!(Ok(5000), fs.read(reader, &mut buf));
    assert_eq!(data[..], buf[..5000]);

    // 另一个描述符在末尾追加的块也读得到
    assert_eq!(Ok(4000), fs.write(writer, &pattern(4000)));
    assert_eq!(Ok(4000), fs.read(reader, &mut buf));
    assert_eq!(pattern(4000)[..], buf[..4000]);
}

#[test]
fn zero_length_write_allocates_nothing() {
    let mut fs = mount(formatted(DISK_BLOCKS));
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    assert_eq!(Ok(0), fs.write(fd, &[]));
    assert_eq!(8191, free_blocks(&fs));
    assert_eq!(BlockId::EOC, fs.list().unwrap()[0].first_block);
}

#[test]
fn volume_full_is_partial_success() {
    // 3个数据块，其中2个可用
    let mut fs = mount(formatted(6));
    assert_eq!(2, free_blocks(&fs));

    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    assert_eq!(Ok(2 * BLOCK_SIZE), fs.write(fd, &pattern(3 * BLOCK_SIZE)));
    assert_eq!(Ok(2 * BLOCK_SIZE), fs.stat(fd));
    assert_eq!(Ok(0), fs.write(fd, b"more"));
    assert_eq!(0, free_blocks(&fs));

    fs.create("g").unwrap();
    let g = fs.open("g").unwrap();
    assert_eq!(Ok(0), fs.write(g, b"nothing fits"));
    assert_eq!(Ok(0), fs.stat(g));

    fs.close(fd).unwrap();
    fs.close(g).unwrap();
    fs.delete("f").unwrap();
    let g = fs.open("g").unwrap();
    assert_eq!(Ok(12), fs.write(g, b"nothing fits"));
}

#[test]
fn write_stops_on_device_error() {
    let disk = FlakyDisk::formatted(DISK_BLOCKS);
    let mut fs = mount(disk.clone());
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    let before = free_blocks(&fs);

    // 第一个块写成功，第二个失败
    disk.allow_writes(1);
    let data = pattern(3 * BLOCK_SIZE);
    assert_eq!(Ok(BLOCK_SIZE), fs.write(fd, &data));
    assert_eq!(Ok(BLOCK_SIZE), fs.stat(fd));
    // 没写成的第二块已归还
    assert_eq!(before - 1, free_blocks(&fs));

    // 设备恢复后从断点继续，已分配的块被复用
    disk.heal();
    assert_eq!(Ok(2 * BLOCK_SIZE), fs.write(fd, &data[BLOCK_SIZE..]));
    assert_eq!(before - 3, free_blocks(&fs));

    fs.seek(fd, 0).unwrap();
    let mut buf = vec![0u8; 3 * BLOCK_SIZE];
    assert_eq!(Ok(3 * BLOCK_SIZE), fs.read(fd, &mut buf));
    assert_eq!(data, buf);
}

#[test]
fn first_block_device_error() {
    let disk = FlakyDisk::formatted(DISK_BLOCKS);
    let mut fs = mount(disk.clone());
    fs.create("f").unwrap();
    let fd = fs.open("f").unwrap();
    let before = free_blocks(&fs);

    disk.allow_writes(0);
    assert_eq!(
        Err(Error::Device(tinyfat::DeviceError::Io)),
        fs.write(fd, b"lost")
    );
    assert_eq!(Ok(0), fs.stat(fd));
    // 仍是不占块的空文件
    assert_eq!(BlockId::EOC, fs.list().unwrap()[0].first_block);
    assert_eq!(before, free_blocks(&fs));

    disk.break_reads();
    let mut buf = [0u8; 4];
    assert_eq!(Ok(0), fs.read(fd, &mut buf));

    disk.heal();
    assert_eq!(Ok(4), fs.write(fd, b"kept"));
    assert_eq!(BlockId::MIN, fs.list().unwrap()[0].first_block);
    fs.seek(fd, 0).unwrap();
    assert_eq!(Ok(4), fs.read(fd, &mut buf));
    assert_eq!(b"kept", &buf);
}

#[test]
fn read_device_error() {
    let disk = FlakyDisk::formatted(DISK_BLOCKS);
    let mut fs = mount(disk.clone());
    write_file(&mut fs, "f", &pattern(100));

    let fd = fs.open("f").unwrap();
    disk.break_reads();
    let mut buf = [0u8; 100];
    assert_eq!(Err(Error::Device(tinyfat::DeviceError::Io)), fs.read(fd, &mut buf));

    disk.heal();
    assert_eq!(Ok(100), fs.read(fd, &mut buf));
}

#[test]
fn unmount_write_back_failure_keeps_volume() {
    let disk = FlakyDisk::formatted(DISK_BLOCKS);
    let mut fs = mount(disk.clone());
    fs.create("f").unwrap();

    disk.allow_writes(0);
    assert_eq!(Err(Error::Device(tinyfat::DeviceError::Io)), fs.unmount());
    assert!(fs.is_mounted());

    disk.heal();
    assert_eq!(Ok(()), fs.unmount());
    let fs = mount(disk);
    assert_eq!("f", fs.list().unwrap()[0].name);
}

#[test]
fn mount_read_failure() {
    let disk = FlakyDisk::formatted(16);
    disk.break_reads();
    let mut fs = FileSystem::new();
    assert_eq!(Err(Error::Device(tinyfat::DeviceError::Io)), fs.mount(disk));
    assert!(!fs.is_mounted());
}
