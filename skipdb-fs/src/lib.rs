mod memory;
mod native;
mod traits;

pub use memory::{MemFile, MemFileSystem};
pub use native::{NativeFile, NativeFileSystem};
pub use traits::{File, FileSystem};

pub mod prelude {
    pub use crate::{
        memory::MemFileSystem,
        native::NativeFileSystem,
        traits::{File, FileSystem},
    };
}
