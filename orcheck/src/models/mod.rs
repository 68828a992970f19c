//! Domain model of a weekly OR list.

pub mod catalog;
pub mod comments;
pub mod constraints;
pub mod ledger;
pub mod macros;
pub mod observation;
pub mod target;
pub mod time;

pub use catalog::*;
pub use comments::*;
pub use constraints::*;
pub use ledger::*;
pub use observation::*;
pub use target::*;
pub use time::*;
