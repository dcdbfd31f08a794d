//! Catalog index and display ordering

pub mod index;
pub mod ordering;

pub use index::CatalogIndex;
pub use ordering::order_for_display;
