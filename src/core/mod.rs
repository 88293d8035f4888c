//! Transactional invalidation core: listener registries, the local
//! dispatcher, the frame stack and the session tying them together.

mod callbacks;
mod dispatch;
mod init_file;
mod session;
mod xact;

pub use callbacks::*;
pub use dispatch::*;
pub use init_file::*;
pub use session::*;
pub use xact::*;
