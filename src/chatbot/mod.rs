pub mod completion;
pub mod context;
pub mod error;
pub mod handlers;
pub mod responder;
pub mod topics;

pub use completion::*;
pub use context::*;
pub use error::*;
pub use handlers::*;
pub use responder::*;
pub use topics::*;
