mod outline;
mod page;
mod tool;

pub use outline::*;
pub use page::*;
pub use tool::*;
