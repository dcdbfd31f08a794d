//! Elidune catalog and circulation core
//!
//! An in-memory catalog index with display ordering, a member directory, and a
//! circulation ledger that keeps copy counts, due dates and fines consistent
//! across issues and returns. Persistence is delegated to a [`RecordStore`].
//!
//! ```rust,ignore
//! let store = Arc::new(InMemoryStore::new());
//! let services = Services::load(&AppConfig::load()?, store, Arc::new(SystemClock)).await?;
//!
//! services.catalog.add_book(NewBook::new("9780441013593", "Dune")).await?;
//! services.members.save_member(NewMember::new("Asha").roll("CS-01")).await?;
//! let loan = services.loans.issue("Dune", "CS-01", Some("14")).await?;
//! let receipt = services.loans.return_loan(loan.id).await?;
//! ```

pub mod catalog;
pub mod circulation;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod members;
pub mod models;
pub mod repository;
pub mod resolver;
pub mod services;

pub use catalog::{order_for_display, CatalogIndex};
pub use circulation::CirculationLedger;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use members::MemberDirectory;
pub use repository::{InMemoryStore, RecordStore};
pub use resolver::IdentifierResolver;
pub use services::Services;
