//! Access to the pipeline's `configuration.conf`: typed loading, whole-file
//! checks and validated, atomic updates.

pub mod ini;
pub mod model;
pub mod store;


pub use model::{
    AwsSettings, ConfigIssue, ConfigUpdate, Configuration, ExtractionLimit, ExtractionSettings,
    RedditCredentials, TimeFilter, AWS_SECTION, EXTRACTION_SECTION, REDDIT_SECTION,
};
pub use store::ConfigStore;
