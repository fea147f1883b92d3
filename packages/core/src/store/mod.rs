//! Persistence Layer
//!
//! Durable storage for the component collection, behind the
//! [`ComponentStore`] trait:
//!
//! - `ApiStore` - networked REST backend; the server assigns ids and
//!   performs the cascade delete
//! - `LocalStore` - single JSON document on local disk; ids are UUID v4
//!   and the cascade runs client-side
//!
//! The workspace service holds an `Arc<dyn ComponentStore>` and never
//! depends on which backend is behind it.

mod api_store;
mod component_store;
mod error;
mod local_store;

pub use api_store::ApiStore;
pub use component_store::{ComponentStore, StoreDeleteReceipt};
pub use error::StoreError;
pub use local_store::LocalStore;
