//! Types kept in the visitor's session and shared by every page.

mod flash;
mod layout;
pub mod session;

pub use flash::{Flash, FlashKind};
pub use layout::Layout;
pub use session::{CurrentSession, keys as session_keys};
