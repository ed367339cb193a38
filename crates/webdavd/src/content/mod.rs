//! Immutable content shared by every connection: the MIME table, the static
//! response pages, and directory listings streamed from transferred handles.

mod errors;
mod listing;
mod mime;
mod pages;

pub use self::errors::ContentError;
pub(crate) use self::listing::DirectoryListing;
pub(crate) use self::mime::MimeTypes;
pub(crate) use self::pages::{Page, StaticPages};
