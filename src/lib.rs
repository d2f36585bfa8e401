// Library interface for pagespeed-audit
// This allows integration tests to access the modules

pub mod audit;
pub mod error;
pub mod input;
pub mod metrics;
pub mod network;
pub mod normalize;
pub mod options;
pub mod pagespeed;
pub mod report;
pub mod utils;
