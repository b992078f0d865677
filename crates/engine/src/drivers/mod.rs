mod db_backed;
mod fs_store;
mod http_stats;

pub use db_backed::{DbAccountDirectory, DbActivityFeed};
pub use fs_store::FsDocumentStore;
pub use http_stats::{HttpStatSink, NoopStatSink};
