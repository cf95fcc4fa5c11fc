//! A mounted lookup table: options store, coordinator and refresh epoch wired together.
//!
//! The owner drives it from one loop: table events go in through the navigation
//! methods, finished lookups are drained with [`LookupTable::pump`] (or awaited with
//! [`LookupTable::next_settlement`]), and rendering reads [`LookupTable::state`],
//! [`LookupTable::options`] and [`LookupTable::pagination`].

use crate::coordinator::{
    ErrorSink, Generation, LookupCoordinator, LookupState, RefreshEpoch, SettleOutcome,
    Settlement,
};
use crate::debug::{self, cat};
use crate::endpoint::LookupEndpoint;
use crate::krist_api::KristClient;
use crate::options::{LookupOptions, QueryOptionsStore, SortField, TableChange};
use crate::pagination::PaginationSettings;
use std::sync::Arc;
use tokio::sync::mpsc::{error::TryRecvError, unbounded_channel, UnboundedReceiver};

/// The blocks table backed by a Krist node.
pub type BlocksTable = LookupTable<KristClient>;

pub struct LookupTable<E: LookupEndpoint> {
    store: QueryOptionsStore,
    coordinator: LookupCoordinator<E>,
    settle_rx: UnboundedReceiver<Settlement<E::Item>>,
    refresh_epoch: RefreshEpoch,
    mounted: bool,
}

impl<E: LookupEndpoint> LookupTable<E> {
    pub fn new(endpoint: Arc<E>, initial: LookupOptions) -> Self {
        let (settle_tx, settle_rx) = unbounded_channel();
        Self {
            store: QueryOptionsStore::new(initial),
            coordinator: LookupCoordinator::new(endpoint, settle_tx),
            settle_rx,
            refresh_epoch: 0,
            mounted: false,
        }
    }

    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.coordinator = self.coordinator.with_error_sink(sink);
        self
    }

    pub fn cancel_superseded(mut self, on: bool) -> Self {
        self.coordinator = self.coordinator.cancel_superseded(on);
        self
    }

    /// Start with a refresh epoch supplied by the owning context.
    pub fn with_refresh_epoch(mut self, epoch: RefreshEpoch) -> Self {
        self.refresh_epoch = epoch;
        self
    }

    // ----- getters -----
    pub fn options(&self) -> &LookupOptions {
        self.store.current()
    }

    pub fn state(&self) -> &LookupState<E::Item> {
        self.coordinator.state()
    }

    pub fn refresh_epoch(&self) -> RefreshEpoch {
        self.refresh_epoch
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn coordinator(&self) -> &LookupCoordinator<E> {
        &self.coordinator
    }

    pub fn pagination(&self) -> PaginationSettings {
        PaginationSettings::new(
            self.store.current(),
            self.coordinator.state().result().map(|r| r.total),
        )
    }

    // ----- lifecycle -----

    /// First lookup. Calling it again while mounted does nothing.
    pub fn mount(&mut self) -> Option<Generation> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        debug::log(cat::UI, "table mounted");
        self.sync()
    }

    /// Drop interest in everything outstanding. The table cannot be remounted.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.coordinator.teardown();
        self.settle_rx.close();
        debug::log(cat::UI, "table unmounted");
    }

    fn sync(&mut self) -> Option<Generation> {
        if !self.mounted {
            return None;
        }
        self.coordinator
            .on_options_or_epoch_change(self.store.current(), self.refresh_epoch)
    }

    // ----- inputs -----

    /// Apply a change reported by the table widget.
    pub fn handle_change(&mut self, change: &TableChange) -> Option<Generation> {
        self.store.apply(change)?;
        self.sync()
    }

    /// Set the external refresh epoch. A new value re-runs the current query.
    pub fn set_refresh_epoch(&mut self, epoch: RefreshEpoch) -> Option<Generation> {
        if epoch == self.refresh_epoch {
            return None;
        }
        self.refresh_epoch = epoch;
        self.sync()
    }

    pub fn bump_refresh(&mut self) -> Option<Generation> {
        self.set_refresh_epoch(self.refresh_epoch.wrapping_add(1))
    }

    pub fn go_to_page(&mut self, page: u64) -> Option<Generation> {
        let pagination = self.pagination();
        let page = page.clamp(1, pagination.page_count());
        self.handle_change(&TableChange::page(page, pagination.page_size))
    }

    pub fn next_page(&mut self) -> Option<Generation> {
        let pagination = self.pagination();
        if !pagination.has_next() {
            return None;
        }
        self.go_to_page(pagination.current_page + 1)
    }

    pub fn prev_page(&mut self) -> Option<Generation> {
        let pagination = self.pagination();
        if !pagination.has_prev() {
            return None;
        }
        self.go_to_page(pagination.current_page - 1)
    }

    pub fn last_page(&mut self) -> Option<Generation> {
        let count = self.pagination().page_count();
        self.go_to_page(count)
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Option<Generation> {
        self.handle_change(&TableChange::page_size(page_size))
    }

    /// Header click on a sortable column.
    pub fn sort_by(&mut self, field: SortField) -> Option<Generation> {
        let current_page = self.store.current().page();
        let page_size = self.store.current().limit();
        self.handle_change(&TableChange::sort_by(field).with_page(current_page, page_size))
    }

    // ----- settlements -----

    /// Apply every settlement already delivered, without waiting.
    pub fn pump(&mut self) -> Vec<SettleOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.settle_rx.try_recv() {
                Ok(settlement) => outcomes.push(self.coordinator.settle(settlement)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        outcomes
    }

    /// Wait for the next settlement and apply it. `None` once unmounted.
    pub async fn next_settlement(&mut self) -> Option<SettleOutcome> {
        if !self.mounted {
            return None;
        }
        let settlement = self.settle_rx.recv().await?;
        Some(self.coordinator.settle(settlement))
    }

    /// Wait until the current lookup has settled (or nothing is loading).
    pub async fn settled(&mut self) -> Option<SettleOutcome> {
        let mut last = None;
        while self.state().loading() {
            last = Some(self.next_settlement().await?);
        }
        last
    }
}
