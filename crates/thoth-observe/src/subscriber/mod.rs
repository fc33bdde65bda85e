mod journal;
mod view;

pub use journal::Journal;
pub use view::log_event;
