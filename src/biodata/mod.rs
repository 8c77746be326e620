//! HTTP surface: preview, export, photo cropping, drafts and saved biodata.

pub mod drafts;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod saved;

pub use drafts::DRAFT_SESSION_HEADER;
