//! Screens: catalog pagination, inline keyboards and message texts
//!
//! Nothing here performs I/O. The executor fetches data, hands it to these
//! builders and passes the result to the messenger.

mod catalog;
mod keyboard;
pub mod text;

pub use catalog::CatalogPage;
pub use keyboard::{Button, CallbackAction, InvalidCallback, Keyboard};
