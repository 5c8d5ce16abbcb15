//! Media loading and payload classification for outbound sends.

pub mod fetch;
pub mod kind;
pub mod mime;

pub use fetch::{FetchedMedia, HttpMediaFetcher, MediaFetcher};
pub use kind::{classify, PayloadKind, SendMethod};
