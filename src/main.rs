use clap::Parser;
use tracing_subscriber::EnvFilter;
use tripbook::cli::{
    handle_days, handle_expense_add, handle_expense_delete, handle_expense_list, handle_init,
    handle_note_add, handle_note_attach, handle_note_delete, handle_note_detach, handle_note_edit,
    handle_note_list, handle_reset, handle_total, Cli, Commands, ExpenseAction, NoteAction,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tripbook=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let day = cli.day;
    let rate = cli.rate;

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::Days { json } => handle_days(rate, json),
        Commands::Note(note) => match note.action {
            NoteAction::Add { json } => handle_note_add(day, json),
            NoteAction::Edit { id, text, stdin } => handle_note_edit(day, id, text, stdin),
            NoteAction::Attach { id, files } => handle_note_attach(day, id, files),
            NoteAction::Detach { id } => handle_note_detach(day, id),
            NoteAction::Delete { id } => handle_note_delete(day, id),
            NoteAction::List { json } => handle_note_list(day, json),
        },
        Commands::Expense(expense) => match expense.action {
            ExpenseAction::Add {
                item,
                amount,
                currency,
                json,
            } => handle_expense_add(day, rate, item, amount, currency, json),
            ExpenseAction::Delete { id } => handle_expense_delete(day, id),
            ExpenseAction::List { json } => handle_expense_list(day, rate, json),
        },
        Commands::Total { all, json } => handle_total(day, rate, all, json),
        Commands::Reset { force } => handle_reset(force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
