//! Plugin side of the Quill suggestion protocol.
//!
//! A plugin implements [`PluginService`] and hands it, together with the
//! channel connected to the host, to [`PluginServer::bind`]. The server
//! decodes each request, calls the matching service method and replies with
//! the same correlation id and reply handle.

mod error;
mod server;
mod service;


pub use error::ServeError;
pub use server::PluginServer;
pub use service::PluginService;
