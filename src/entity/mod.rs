mod expense;
mod note;

pub use expense::{Currency, Expense, ExpenseDraft};
pub use note::Note;

/// Zero-based index of a day in the itinerary. Scope key for both ledgers.
pub type DayIndex = u32;

/// Identifier shared by notes and expenses. Minted by the journal, unique
/// across both ledger kinds.
pub type RecordId = u64;

/// Largest id a record may carry: 2^53 - 1, the last integer that survives a
/// round trip through a JSON number in every consumer.
pub const MAX_RECORD_ID: RecordId = (1 << 53) - 1;

/// A record that lives in a day-scoped ledger.
pub trait Record: Clone {
    /// Short name used in log lines and error messages.
    const KIND: &'static str;

    fn id(&self) -> RecordId;

    /// Whether a record read back from storage still satisfies the
    /// invariants that creation enforces.
    fn is_valid(&self) -> bool {
        true
    }
}
