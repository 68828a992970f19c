//! Orchestration of the checking stages over one OR list.
//!
//! ```no_run
//! use orcheck::pipeline::{CheckConfig, Pipeline};
//! use std::path::Path;
//!
//! let config = CheckConfig::from_file("orcheck.toml").expect("config");
//! let report = Pipeline::with_config(config)
//!     .run_file(Path::new("week_310.or"))
//!     .expect("structurally valid OR list");
//! println!("{}", report.to_json().expect("json"));
//! ```

pub mod checksum;
pub mod config;
pub mod runner;

pub use checksum::snapshot_checksum;
pub use config::CheckConfig;
pub use runner::Pipeline;
