pub mod buckets;
pub mod enums;
pub mod filter;
pub mod task;

pub use buckets::{bucketize, completion_rate, TodaySummary};
pub use enums::{Bucket, Category, Priority, Screen, UiMode};
pub use filter::{filter, title_matches, Tag, TagSet};
pub use task::{NewTask, Task, TaskPatch};
