use crate::columns;
use crate::debug::{self, cat};
use crate::endpoint::{LookupEndpoint, LookupError};
use crate::options::QueryOptionsStore;
use crate::table::LookupTable;
use crate::types::KristBlock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// View state for the blocks screen.
pub struct App<E: LookupEndpoint<Item = KristBlock>> {
    quit: bool,
    table: LookupTable<E>,
    fps: u32,
    sel_row: usize,

    // Failures surfaced by the table's error sink
    error_rx: UnboundedReceiver<LookupError>,
    errors_seen: u64,

    toast_message: Option<(String, Instant)>,
}

impl<E: LookupEndpoint<Item = KristBlock>> App<E> {
    pub fn new(endpoint: Arc<E>, page_size: u32, fps: u32, cancel_superseded: bool) -> Self {
        let (error_tx, error_rx) = unbounded_channel();
        let table = LookupTable::new(
            endpoint,
            QueryOptionsStore::initial_with_page_size(page_size),
        )
        .cancel_superseded(cancel_superseded)
        .with_error_sink(Box::new(move |err: &LookupError| {
            let _ = error_tx.send(err.clone());
        }));

        Self {
            quit: false,
            table,
            fps,
            sel_row: 0,
            error_rx,
            errors_seen: 0,
            toast_message: None,
        }
    }

    // ----- getters -----
    pub fn fps(&self) -> u32 {
        self.fps
    }
    pub fn quit_flag(&self) -> bool {
        self.quit
    }
    pub fn table(&self) -> &LookupTable<E> {
        &self.table
    }
    pub fn sel_row(&self) -> usize {
        self.sel_row
    }
    pub fn errors_seen(&self) -> u64 {
        self.errors_seen
    }

    pub fn rows(&self) -> &[KristBlock] {
        self.table
            .state()
            .result()
            .map(|r| r.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_block(&self) -> Option<&KristBlock> {
        self.rows().get(self.sel_row)
    }

    /// Current toast message, if still visible
    pub fn toast_message(&self) -> Option<&str> {
        self.toast_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < TOAST_DURATION {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    pub fn show_toast(&mut self, msg: String) {
        self.toast_message = Some((msg, Instant::now()));
    }

    // ----- lifecycle -----
    pub fn mount(&mut self) {
        self.table.mount();
    }

    pub fn shutdown(&mut self) {
        self.table.unmount();
        self.quit = true;
    }

    /// Apply finished lookups and surface failures. Returns true if anything changed.
    pub fn pump(&mut self) -> bool {
        let outcomes = self.table.pump();
        let mut changed = !outcomes.is_empty();

        while let Ok(err) = self.error_rx.try_recv() {
            self.errors_seen += 1;
            self.show_toast(format!("Lookup failed: {err}"));
            changed = true;
        }

        let len = self.rows().len();
        if self.sel_row >= len {
            self.sel_row = len.saturating_sub(1);
        }
        changed
    }

    /// Wait for the table's next settlement, then pump.
    pub async fn wait_settled(&mut self) {
        let _ = self.table.settled().await;
        self.pump();
    }

    // ----- navigation -----
    pub fn next_page(&mut self) {
        if self.table.next_page().is_some() {
            self.sel_row = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.table.prev_page().is_some() {
            self.sel_row = 0;
        }
    }

    pub fn first_page(&mut self) {
        if self.table.go_to_page(1).is_some() {
            self.sel_row = 0;
        }
    }

    pub fn last_page(&mut self) {
        if self.table.last_page().is_some() {
            self.sel_row = 0;
        }
    }

    pub fn grow_page_size(&mut self) {
        let pagination = self.table.pagination();
        if pagination.show_size_changer {
            self.table.set_page_size(pagination.next_page_size());
        }
    }

    pub fn shrink_page_size(&mut self) {
        let pagination = self.table.pagination();
        if pagination.show_size_changer {
            self.table.set_page_size(pagination.prev_page_size());
        }
    }

    /// Header click on the `n`th sortable column (0-based).
    pub fn sort_column(&mut self, n: usize) {
        if let Some((column, field)) = columns::sortable().nth(n) {
            if debug::is(cat::UI) {
                debug::log(cat::UI, format!("sort header '{}'", column.title));
            }
            if self.table.sort_by(field).is_some() {
                self.sel_row = 0;
            }
        }
    }

    pub fn refresh(&mut self) {
        self.table.bump_refresh();
    }

    /// Timer-driven refresh. Skipped while a lookup is outstanding, otherwise a node
    /// slower than the timer would never get to settle.
    pub fn refresh_tick(&mut self) -> bool {
        if self.table.state().loading() {
            debug::log(cat::UI, "refresh tick skipped, lookup outstanding");
            return false;
        }
        self.table.bump_refresh().is_some()
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.sel_row = (self.sel_row + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.sel_row = self.sel_row.saturating_sub(1);
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }
}
