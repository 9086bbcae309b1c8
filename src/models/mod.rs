mod bookmark;
mod devotional;
mod program;

pub use bookmark::{Bookmark, NewBookmark};
pub use devotional::Devotional;
pub use program::Program;
