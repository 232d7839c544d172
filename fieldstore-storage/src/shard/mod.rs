//! Bounded-fanout directory sharding for uploaded media.
//!
//! Each media kind owns a tree of fixed depth D under its root. Every
//! directory holds at most F numerically named children, and files are only
//! written into leaves (directories exactly D levels down):
//!
//! ```text
//! images/
//! ├── 000/
//! │   ├── 000/   <- full
//! │   └── 001/   <- current leaf
//! └── ...
//! ```
//!
//! When the current leaf is full the allocator climbs to the nearest
//! ancestor with room, creates the next sibling there and a `0` chain back
//! down to leaf depth. When the root itself is full the tree is exhausted.

pub mod allocator;
pub mod naming;

pub use allocator::{ShardState, ShardedDirectoryAllocator};
pub use naming::{directory_name, is_numeric_name, name_width, parse_directory_number};
