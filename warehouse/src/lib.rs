pub mod freshness;
pub mod local_files;
pub mod redshift;


pub use freshness::FreshnessReporter;
pub use local_files::LocalFiles;
pub use redshift::{RedshiftTarget, RedshiftWarehouse};
