//! Battle-mode UI controllers.

mod control_bar;
mod session_view;
mod watchdog;

pub use control_bar::*;
pub use session_view::*;
pub use watchdog::*;
