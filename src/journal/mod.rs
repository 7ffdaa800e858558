//! The journal: application state plus write-through persistence.
//!
//! Every operation builds an [`Action`], runs it through the pure
//! [`AppState::apply`], keeps the resulting state and then saves whichever
//! ledger document the transition touched. A failed save never rolls the
//! in-memory state back; the error is handed to the caller to report.

mod state;

pub use state::{Action, AppState, Persist, Transition};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::config::JournalConfig;
use crate::currency::{ExchangeRate, Totals};
use crate::entity::{Currency, DayIndex, Expense, ExpenseDraft, Note, RecordId};
use crate::error::{Result, TripbookError};
use crate::photo::{EncodedImage, ImageCodec};
use crate::storage::{JsonStore, Ledger};

/// Subdirectory of the data dir holding the persisted documents.
pub const STORE_DIR: &str = "store";

/// Millisecond clock used to mint timestamp-like ids.
pub type Clock = fn() -> u64;

fn system_clock() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub struct Journal {
    state: AppState,
    store: JsonStore,
    codec: ImageCodec,
    config: JournalConfig,
    day_count: u32,
    clock: Clock,
}

impl Journal {
    /// Open the journal stored under `data_dir`, loading both ledgers.
    /// Unreadable documents load as empty ledgers.
    pub fn open(data_dir: &Path, config: JournalConfig, day_count: u32) -> Result<Self> {
        config.validate()?;
        let store = JsonStore::open(&data_dir.join(STORE_DIR), config.quota_bytes)?;
        let codec = ImageCodec::new(config.image.max_width, config.image.quality)?;
        let rate = ExchangeRate::new(config.default_rate)?;

        let notes: Ledger<Note> = Ledger::from_document(&store.load(&config.notes_key));
        let expenses: Ledger<Expense> = Ledger::from_document(&store.load(&config.expenses_key));
        debug!(
            notes = notes.len(),
            expenses = expenses.len(),
            "opened journal"
        );

        Ok(Self {
            state: AppState::new(notes, expenses, rate),
            store,
            codec,
            config,
            day_count,
            clock: system_clock,
        })
    }

    /// Replace the id clock. Ids stay unique whatever the clock returns.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn codec(&self) -> ImageCodec {
        self.codec
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    pub fn active_day(&self) -> DayIndex {
        self.state.active_day
    }

    pub fn rate(&self) -> ExchangeRate {
        self.state.rate
    }

    pub fn select_day(&mut self, day: DayIndex) -> Result<()> {
        if day >= self.day_count {
            return Err(TripbookError::InvalidDay {
                day,
                day_count: self.day_count,
            });
        }
        self.dispatch(Action::SelectDay(day))
    }

    /// Change the exchange rate for this session. Not persisted.
    pub fn set_rate(&mut self, rate: ExchangeRate) -> Result<()> {
        self.dispatch(Action::SetRate(rate))
    }

    /// Notes of the active day, in creation order.
    pub fn notes(&self) -> Arc<Vec<Note>> {
        self.state.day_notes()
    }

    /// Expenses of the active day, in creation order.
    pub fn expenses(&self) -> Arc<Vec<Expense>> {
        self.state.day_expenses()
    }

    pub fn note(&self, id: RecordId) -> Option<&Note> {
        self.state.notes.get(self.state.active_day, id)
    }

    pub fn expense(&self, id: RecordId) -> Option<&Expense> {
        self.state.expenses.get(self.state.active_day, id)
    }

    /// Append a blank note to the active day and return its id.
    ///
    /// The note stays in memory even if saving fails.
    pub fn add_note(&mut self) -> Result<RecordId> {
        let id = self.state.next_id((self.clock)())?;
        self.dispatch(Action::AddNote { id })?;
        Ok(id)
    }

    pub fn update_text(&mut self, id: RecordId, text: String) -> Result<()> {
        self.dispatch(Action::UpdateText { id, text })
    }

    pub fn attach_image(&mut self, id: RecordId, image: EncodedImage) -> Result<()> {
        self.dispatch(Action::AttachImage { id, image })
    }

    pub fn remove_image(&mut self, id: RecordId) -> Result<()> {
        self.dispatch(Action::RemoveImage { id })
    }

    pub fn delete_note(&mut self, id: RecordId) -> Result<()> {
        self.dispatch(Action::DeleteNote { id })
    }

    /// Encode the first of `files` and attach it to note `id`.
    ///
    /// Nothing changes until encoding has finished; a decode failure leaves
    /// any existing photo in place.
    pub async fn attach_image_file(&mut self, id: RecordId, files: &[PathBuf]) -> Result<()> {
        let path = files
            .first()
            .ok_or_else(|| TripbookError::ImageDecode("no file supplied".to_string()))?;
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| TripbookError::ImageDecode(format!("{}: {}", path.display(), e)))?;
        let image = self.codec.encode(raw).await?;
        self.attach_image(id, image)
    }

    /// Validate the form input and append an expense to the active day.
    pub fn add_expense(
        &mut self,
        item: &str,
        amount_text: &str,
        currency: Currency,
    ) -> Result<RecordId> {
        let draft = ExpenseDraft::parse(item, amount_text, currency)?;
        let id = self.state.next_id((self.clock)())?;
        self.dispatch(Action::AddExpense(draft.into_expense(id)))?;
        Ok(id)
    }

    pub fn delete_expense(&mut self, id: RecordId) -> Result<()> {
        self.dispatch(Action::DeleteExpense { id })
    }

    pub fn daily_total(&self) -> Totals {
        self.state.daily_total()
    }

    pub fn grand_total(&self) -> Totals {
        self.state.grand_total()
    }

    /// Totals for one specific day, whatever the active day is.
    pub fn total_for_day(&self, day: DayIndex) -> Totals {
        crate::currency::compute_total(self.state.expenses.day(day).iter(), self.state.rate)
    }

    /// Drop every note and expense and delete both stored documents.
    /// Confirmation is the caller's job.
    pub fn reset(&mut self) -> Result<()> {
        self.dispatch(Action::Reset)?;
        info!("journal reset");
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        let Transition { state, persist } = self.state.apply(action);
        self.state = state;
        self.persist(persist)
    }

    fn persist(&self, persist: Persist) -> Result<()> {
        match persist {
            Persist::Nothing => Ok(()),
            Persist::Notes => self.store.save(&self.config.notes_key, &self.state.notes),
            Persist::Expenses => self
                .store
                .save(&self.config.expenses_key, &self.state.expenses),
            Persist::RemoveAll => {
                let notes = self.store.remove(&self.config.notes_key);
                let expenses = self.store.remove(&self.config.expenses_key);
                notes.and(expenses)
            }
        }
    }
}
