mod arena;
mod error;
mod level;
mod skip_list;

pub use error::{Error, Result};
pub use level::{LevelGenerator, RandomLevel};
pub use skip_list::{Iter, Node, ReadView, SkipList};

pub mod prelude {
    pub use crate::{
        error::Error,
        level::prelude::*,
        skip_list::{ReadView, SkipList},
    };
}
