//! Persistence and network edge for Medietat: the offer store contract with
//! its Postgres and in-memory implementations, the retrying page fetcher, and
//! the headless-render service handle.

mod fetch;
mod offers;
mod pg;
mod render;

pub use fetch::{BackoffPolicy, FetchError, FetcherConfig, PageFetcher};
pub use offers::{
    MemoryOfferStore, NewOffer, OfferChangeSet, OfferFilter, OfferPage, OfferStore, StoreError,
};
pub use pg::PgOfferStore;
pub use render::{HttpRenderer, RenderError, RenderService, Renderer, RendererConfig};

pub const CRATE_NAME: &str = "medietat-store";
