mod drivers;
mod gate;
mod moderation;
mod traits;

pub use drivers::{DbAccountDirectory, DbActivityFeed, FsDocumentStore, HttpStatSink, NoopStatSink};
pub use gate::{PublishGate, PublishOutcome, PublishService};
pub use moderation::{ModerationEngine, ModerationOutcome, ReportOutcome};
pub use traits::{AccountDirectory, ActivityFeed, DocumentStore, StatSink};

pub(crate) fn new_id() -> String {
    format!("{:x}", rand::random::<u128>())
}
