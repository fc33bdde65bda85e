mod logger;
pub use logger::*;

mod subscriber;
pub use subscriber::{Journal, log_event};
