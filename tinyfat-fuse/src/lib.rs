//! 在宿主机上操作tinyfat镜像


mod block_file;
pub mod commands;

pub use self::block_file::BlockFile;
