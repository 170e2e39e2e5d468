mod health;
mod items;
mod process;
mod sse;

pub use health::*;
pub use items::*;
pub use process::*;
pub use sse::*;
