pub mod cli;
pub mod clock;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod form;
pub mod notify;
pub mod probe;
pub mod router;
pub mod session;
pub mod timer;

pub use pagetrack_common::error;
pub use pagetrack_common::protocol;
