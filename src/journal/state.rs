//! Pure application state and its transitions.

use crate::currency::{compute_total, ExchangeRate, Totals};
use crate::entity::{DayIndex, Expense, Note, RecordId, MAX_RECORD_ID};
use crate::error::{Result, TripbookError};
use crate::photo::EncodedImage;
use crate::storage::Ledger;

/// Everything the journal knows, as a value. `apply` never mutates in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub active_day: DayIndex,
    pub rate: ExchangeRate,
    pub notes: Ledger<Note>,
    pub expenses: Ledger<Expense>,
    last_id: RecordId,
}

/// One user action. Record-level actions apply to the active day.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectDay(DayIndex),
    SetRate(ExchangeRate),
    AddNote { id: RecordId },
    UpdateText { id: RecordId, text: String },
    AttachImage { id: RecordId, image: EncodedImage },
    RemoveImage { id: RecordId },
    DeleteNote { id: RecordId },
    AddExpense(Expense),
    DeleteExpense { id: RecordId },
    Reset,
}

/// Which persisted document a transition touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Nothing,
    Notes,
    Expenses,
    RemoveAll,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: AppState,
    pub persist: Persist,
}

impl AppState {
    pub fn new(notes: Ledger<Note>, expenses: Ledger<Expense>, rate: ExchangeRate) -> Self {
        let last_id = notes
            .max_id()
            .into_iter()
            .chain(expenses.max_id())
            .max()
            .unwrap_or(0);
        Self {
            active_day: 0,
            rate,
            notes,
            expenses,
            last_id,
        }
    }

    /// Next id given the current clock reading: the clock value if it is
    /// ahead of every id handed out so far, otherwise one past the last id.
    /// Fails once ids would pass [`MAX_RECORD_ID`].
    pub fn next_id(&self, now_millis: u64) -> Result<RecordId> {
        self.last_id
            .checked_add(1)
            .map(|next| next.max(now_millis))
            .filter(|id| *id <= MAX_RECORD_ID)
            .ok_or(TripbookError::IdsExhausted {
                last_id: self.last_id,
            })
    }

    pub fn last_id(&self) -> RecordId {
        self.last_id
    }

    pub fn day_notes(&self) -> std::sync::Arc<Vec<Note>> {
        self.notes.day(self.active_day)
    }

    pub fn day_expenses(&self) -> std::sync::Arc<Vec<Expense>> {
        self.expenses.day(self.active_day)
    }

    pub fn daily_total(&self) -> Totals {
        compute_total(self.day_expenses().iter(), self.rate)
    }

    pub fn grand_total(&self) -> Totals {
        compute_total(self.expenses.records(), self.rate)
    }

    pub fn apply(&self, action: Action) -> Transition {
        let day = self.active_day;
        match action {
            Action::SelectDay(active_day) => self.unpersisted(Self {
                active_day,
                ..self.clone()
            }),
            Action::SetRate(rate) => self.unpersisted(Self {
                rate,
                ..self.clone()
            }),
            Action::AddNote { id } => Transition {
                state: Self {
                    notes: self.notes.append(day, Note::new(id)),
                    last_id: self.last_id.max(id),
                    ..self.clone()
                },
                persist: Persist::Notes,
            },
            Action::UpdateText { id, text } => {
                self.with_notes(self.notes.replace(day, id, |n| n.with_text(text)))
            }
            Action::AttachImage { id, image } => {
                self.with_notes(self.notes.replace(day, id, |n| n.with_image(Some(image))))
            }
            Action::RemoveImage { id } => {
                self.with_notes(self.notes.replace(day, id, |n| n.with_image(None)))
            }
            Action::DeleteNote { id } => self.with_notes(self.notes.remove(day, id)),
            Action::AddExpense(expense) => Transition {
                state: Self {
                    last_id: self.last_id.max(expense.id),
                    expenses: self.expenses.append(day, expense),
                    ..self.clone()
                },
                persist: Persist::Expenses,
            },
            Action::DeleteExpense { id } => match self.expenses.remove(day, id) {
                Some(expenses) => Transition {
                    state: Self {
                        expenses,
                        ..self.clone()
                    },
                    persist: Persist::Expenses,
                },
                None => self.unchanged(),
            },
            Action::Reset => Transition {
                state: Self {
                    notes: Ledger::new(),
                    expenses: Ledger::new(),
                    ..self.clone()
                },
                persist: Persist::RemoveAll,
            },
        }
    }

    fn with_notes(&self, notes: Option<Ledger<Note>>) -> Transition {
        match notes {
            Some(notes) => Transition {
                state: Self {
                    notes,
                    ..self.clone()
                },
                persist: Persist::Notes,
            },
            None => self.unchanged(),
        }
    }

    fn unpersisted(&self, state: Self) -> Transition {
        Transition {
            state,
            persist: Persist::Nothing,
        }
    }

    fn unchanged(&self) -> Transition {
        self.unpersisted(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Currency, ExpenseDraft};

    fn image() -> EncodedImage {
        EncodedImage::from_data_url("data:image/jpeg;base64,/9j/".to_string())
    }

    fn expense(id: RecordId, item: &str, amount: &str, currency: Currency) -> Expense {
        ExpenseDraft::parse(item, amount, currency)
            .unwrap()
            .into_expense(id)
    }

    #[test]
    fn test_next_id_is_monotonic_under_a_stalled_clock() {
        let mut state = AppState::default();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = state.next_id(1_000).unwrap();
            ids.push(id);
            state = state.apply(Action::AddNote { id }).state;
        }
        assert_eq!(ids, vec![1_000, 1_001, 1_002, 1_003, 1_004]);
    }

    #[test]
    fn test_ids_shared_across_ledger_kinds() {
        let state = AppState::default().apply(Action::AddNote { id: 50 }).state;
        let id = state.next_id(10).unwrap();
        assert_eq!(id, 51);
        let state = state
            .apply(Action::AddExpense(expense(id, "tea", "1", Currency::Jpy)))
            .state;
        assert_eq!(state.next_id(10).unwrap(), 52);
    }

    #[test]
    fn test_new_seeds_last_id_from_both_ledgers() {
        let notes = Ledger::new().append(0, Note::new(7));
        let expenses = Ledger::new().append(3, expense(12, "bus", "300", Currency::Jpy));
        let state = AppState::new(notes, expenses, ExchangeRate::default());
        assert_eq!(state.last_id(), 12);
        assert_eq!(state.next_id(0).unwrap(), 13);
    }

    #[test]
    fn test_next_id_fails_at_the_top_of_the_id_range() {
        let state = AppState::default()
            .apply(Action::AddNote { id: MAX_RECORD_ID - 1 })
            .state;
        assert_eq!(state.next_id(0).unwrap(), MAX_RECORD_ID);

        let state = state.apply(Action::AddNote { id: MAX_RECORD_ID }).state;
        assert!(matches!(
            state.next_id(0),
            Err(TripbookError::IdsExhausted { last_id: MAX_RECORD_ID })
        ));

        let state = state.apply(Action::AddNote { id: u64::MAX }).state;
        assert!(matches!(
            state.next_id(0),
            Err(TripbookError::IdsExhausted { .. })
        ));
    }

    #[test]
    fn test_note_lifecycle_through_image() {
        let state = AppState::default().apply(Action::AddNote { id: 1 }).state;
        let blank = state.day_notes()[0].clone();

        let attached = state.apply(Action::AttachImage { id: 1, image: image() });
        assert_eq!(attached.persist, Persist::Notes);
        assert_eq!(attached.state.day_notes()[0].image, Some(image()));

        let removed = attached.state.apply(Action::RemoveImage { id: 1 });
        assert_eq!(removed.persist, Persist::Notes);
        assert_eq!(removed.state.day_notes()[0], blank);
    }

    #[test]
    fn test_unknown_id_is_a_noop() {
        let state = AppState::default().apply(Action::AddNote { id: 1 }).state;
        for action in [
            Action::UpdateText { id: 9, text: "x".to_string() },
            Action::AttachImage { id: 9, image: image() },
            Action::RemoveImage { id: 9 },
            Action::DeleteNote { id: 9 },
            Action::DeleteExpense { id: 9 },
        ] {
            let transition = state.apply(action);
            assert_eq!(transition.persist, Persist::Nothing);
            assert_eq!(transition.state, state);
        }
    }

    #[test]
    fn test_actions_are_scoped_to_active_day() {
        let state = AppState::default()
            .apply(Action::AddNote { id: 1 })
            .state
            .apply(Action::SelectDay(2))
            .state;

        // Note 1 lives on day 0, so editing it from day 2 does nothing
        let transition = state.apply(Action::UpdateText { id: 1, text: "x".to_string() });
        assert_eq!(transition.persist, Persist::Nothing);

        let state = state.apply(Action::AddNote { id: 2 }).state;
        assert_eq!(state.day_notes().len(), 1);
        assert_eq!(state.notes.day(0).len(), 1);
    }

    #[test]
    fn test_daily_and_grand_totals() {
        let state = AppState::default()
            .apply(Action::AddExpense(expense(1, "ramen", "1200", Currency::Jpy)))
            .state
            .apply(Action::AddExpense(expense(2, "snack", "50", Currency::Twd)))
            .state;
        assert_eq!(state.daily_total(), Totals { jpy: 1427, twd: 314 });

        let state = state
            .apply(Action::SelectDay(1))
            .state
            .apply(Action::AddExpense(expense(3, "bus", "1000", Currency::Jpy)))
            .state;
        assert_eq!(state.daily_total(), Totals { jpy: 1000, twd: 220 });
        assert_eq!(state.grand_total(), Totals { jpy: 2427, twd: 534 });
    }

    #[test]
    fn test_set_rate_changes_totals_without_persisting() {
        let state = AppState::default()
            .apply(Action::AddExpense(expense(1, "ramen", "1000", Currency::Jpy)))
            .state;
        let transition = state.apply(Action::SetRate(ExchangeRate::new(0.25).unwrap()));
        assert_eq!(transition.persist, Persist::Nothing);
        assert_eq!(transition.state.daily_total(), Totals { jpy: 1000, twd: 250 });
    }

    #[test]
    fn test_reset_clears_both_ledgers() {
        let state = AppState::default()
            .apply(Action::AddNote { id: 1 })
            .state
            .apply(Action::AddExpense(expense(2, "tea", "5", Currency::Twd)))
            .state;
        let transition = state.apply(Action::Reset);
        assert_eq!(transition.persist, Persist::RemoveAll);
        assert!(transition.state.notes.is_empty());
        assert!(transition.state.expenses.is_empty());
    }
}
