//! Business logic services

pub mod catalog;
pub mod loans;
pub mod members;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    catalog::CatalogIndex,
    circulation::CirculationLedger,
    clock::Clock,
    config::AppConfig,
    error::AppResult,
    members::MemberDirectory,
    models::id_after,
    repository::{Change, RecordStore},
};

/// Everything the services mutate, guarded as one unit
#[derive(Debug)]
pub struct LibraryState {
    pub catalog: CatalogIndex,
    pub members: MemberDirectory,
    pub ledger: CirculationLedger,
}

impl LibraryState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            catalog: CatalogIndex::new(config.catalog.bucket_count),
            members: MemberDirectory::new(),
            ledger: CirculationLedger::new(config.circulation.clone()),
        }
    }
}

/// Shared handle on the state, the store and the clock.
///
/// Writers hold the state lock from the first check until the store has
/// accepted the batch and memory is updated, so check-then-act sequences
/// (availability on issue, open status on return) cannot interleave.
#[derive(Clone)]
pub(crate) struct Context {
    state: Arc<Mutex<LibraryState>>,
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl Context {
    pub(crate) async fn lock(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().await
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Hand a batch to the store. Nothing in memory has changed yet when this fails.
    pub(crate) async fn commit(&self, changes: Vec<Change>) -> AppResult<()> {
        self.store.commit(changes).await.map_err(|e| {
            tracing::error!("Store commit failed: {}", e);
            e.into()
        })
    }
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create services over empty indexes
    pub fn new(config: &AppConfig, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_state(LibraryState::new(config), store, clock)
    }

    /// Create services with indexes rebuilt from the store's current contents
    pub async fn load(config: &AppConfig, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let mut snapshot = store.load().await?;
        let mut state = LibraryState::new(config);

        snapshot.books.sort_by_key(|b| b.id);
        snapshot.members.sort_by_key(|m| m.id);
        snapshot.loans.sort_by_key(|l| l.id);

        for book in snapshot.books {
            state.catalog.restore(book)?;
        }
        for member in snapshot.members {
            state.members.save(member)?;
        }

        // Ids of deleted rows stay taken: closed loans still point at them
        state.catalog.reserve_ids(snapshot.next_book_id);
        state.members.reserve_ids(snapshot.next_member_id);
        for loan in &snapshot.loans {
            state.catalog.reserve_ids(id_after(loan.book_id)?);
            state.members.reserve_ids(id_after(loan.member_id)?);
        }

        for loan in snapshot.loans {
            state.ledger.restore(loan)?;
        }

        tracing::info!(
            books = state.catalog.len(),
            members = state.members.len(),
            loans = state.ledger.len(),
            "Library state loaded"
        );
        Ok(Self::with_state(state, store, clock))
    }

    fn with_state(state: LibraryState, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        let context = Context {
            state: Arc::new(Mutex::new(state)),
            store,
            clock,
        };

        Self {
            catalog: catalog::CatalogService::new(context.clone()),
            members: members::MembersService::new(context.clone()),
            loans: loans::LoansService::new(context),
        }
    }
}
