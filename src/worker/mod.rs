pub mod session_ticker;

pub use session_ticker::SessionTicker;
