pub mod devfs;
pub mod vfs;

pub use self::devfs::DevFs;
pub use self::vfs::{syscall_ret, Errno, FsError, INode, Result};
