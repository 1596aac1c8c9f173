use block_dev::DeviceError;
use derive_more::Display;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Error {
    #[display(fmt = "no volume is mounted")]
    NotMounted,
    #[display(fmt = "a volume is already mounted")]
    AlreadyMounted,
    #[display(fmt = "superblock signature mismatch")]
    SignatureMismatch,
    #[display(fmt = "superblock declares {} blocks but the device has {}", declared, actual)]
    SizeMismatch { declared: usize, actual: usize },
    /// 超级块描述的区域装不下它自己的表
    #[display(fmt = "superblock describes an impossible layout")]
    InvalidLayout,
    #[display(fmt = "cannot format a device of {} blocks", blocks)]
    InvalidGeometry { blocks: usize },
    #[display(fmt = "invalid file name")]
    InvalidName,
    #[display(fmt = "no such file")]
    NotFound,
    #[display(fmt = "file already exists")]
    AlreadyExists,
    #[display(fmt = "root directory is full")]
    DirectoryFull,
    #[display(fmt = "file is open")]
    FileInUse,
    #[display(fmt = "files are still open")]
    FilesOpen,
    #[display(fmt = "too many open files")]
    TooManyOpenFiles,
    #[display(fmt = "bad file descriptor")]
    InvalidDescriptor,
    #[display(fmt = "offset {} is past the end of file ({} bytes)", offset, size)]
    OffsetOutOfRange { offset: usize, size: usize },
    #[display(fmt = "device error: {}", _0)]
    Device(DeviceError),
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Device(err) => Some(err),
            _ => None,
        }
    }
}
