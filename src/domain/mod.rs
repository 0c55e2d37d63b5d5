pub mod entry;
pub mod feed;

pub use entry::{Entry, EntryMinimal};
pub use feed::{Feed, FeedWithEntries};
