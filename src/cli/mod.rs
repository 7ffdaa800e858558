mod commands;
mod handlers;

pub use commands::{Cli, Commands, ExpenseAction, ExpenseCommand, NoteAction, NoteCommand};
pub use handlers::{
    handle_days, handle_expense_add, handle_expense_delete, handle_expense_list, handle_init,
    handle_note_add, handle_note_attach, handle_note_delete, handle_note_detach, handle_note_edit,
    handle_note_list, handle_reset, handle_total, DATA_DIR,
};
