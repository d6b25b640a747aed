pub mod layout;
pub mod routes;
mod server;

pub use routes::RequestContext;
pub use server::*;
