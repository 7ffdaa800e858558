use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use serde::Serialize;

use crate::config::JournalConfig;
use crate::currency::{ExchangeRate, Totals};
use crate::entity::{Currency, DayIndex, Expense, Note};
use crate::error::{Result, TripbookError};
use crate::itinerary::Itinerary;
use crate::journal::Journal;
use crate::warnings::{check_thresholds, format_warning, from_error};

pub const DATA_DIR: &str = ".tripbook";

/// Find the project root by looking for .tripbook/ or .git/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(DATA_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    let dir = find_project_root().join(DATA_DIR);
    if !dir.is_dir() {
        return Err(TripbookError::NotInitialized);
    }
    Ok(dir)
}

/// Open the journal with the global flags applied.
fn open_journal(day: DayIndex, rate: Option<ExchangeRate>) -> Result<(Journal, Itinerary)> {
    let dir = data_dir()?;
    let config = JournalConfig::load(&dir)?;
    let itinerary = Itinerary::load(&dir)?;

    let mut journal = Journal::open(&dir, config, itinerary.day_count())?;
    journal.select_day(day)?;
    if let Some(rate) = rate {
        journal.set_rate(rate)?;
    }
    Ok((journal, itinerary))
}

/// Print recoverable errors as warnings; pass everything else through.
fn report(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) => match from_error(&e) {
            Some(warning) => {
                eprintln!("{}", format_warning(&warning));
                Ok(())
            }
            None => Err(e),
        },
    }
}

fn warn_on_usage(journal: &Journal) -> Result<()> {
    let store = journal.store();
    for warning in check_thresholds(store.usage_bytes()?, store.quota_bytes()) {
        eprintln!("{}", format_warning(&warning));
    }
    Ok(())
}

fn require_note(journal: &Journal, id: u64) -> Result<()> {
    if journal.note(id).is_none() {
        return Err(TripbookError::RecordNotFound {
            kind: "note",
            id,
            day: journal.active_day(),
        });
    }
    Ok(())
}

fn format_totals(totals: &Totals) -> String {
    format!(
        "{}{} / {}{}",
        Currency::Jpy.symbol(),
        totals.jpy,
        Currency::Twd.symbol(),
        totals.twd
    )
}

fn format_amount(expense: &Expense) -> String {
    format!("{}{}", expense.currency.symbol(), expense.amount)
}

fn note_summary(note: &Note) -> String {
    let first_line = note.text.lines().next().unwrap_or("").trim();
    let text = if first_line.is_empty() {
        "(empty)"
    } else {
        first_line
    };
    if note.image.is_some() {
        format!("{} [photo]", text)
    } else {
        text.to_string()
    }
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;
    let dir = root.join(DATA_DIR);

    if dir.exists() {
        return Err(TripbookError::AlreadyInitialized);
    }

    fs::create_dir_all(&dir)?;
    JournalConfig::default().write(&dir)?;

    println!("Initialized tripbook journal in {}", root.display());
    Ok(())
}

pub fn handle_days(rate: Option<ExchangeRate>, json: bool) -> Result<()> {
    let (journal, itinerary) = open_journal(0, rate)?;

    if json {
        #[derive(Serialize)]
        struct DayJson<'a> {
            index: DayIndex,
            day: u32,
            date: &'a str,
            title: &'a str,
            notes: usize,
            totals: Totals,
        }

        let days: Vec<_> = itinerary
            .days
            .iter()
            .enumerate()
            .map(|(index, plan)| {
                let index = index as DayIndex;
                DayJson {
                    index,
                    day: plan.day,
                    date: &plan.date,
                    title: &plan.title,
                    notes: journal.state().notes.day(index).len(),
                    totals: journal.total_for_day(index),
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    println!("{}", itinerary.title);
    if let Some(dates) = &itinerary.dates {
        println!("{}", dates);
    }
    println!();
    for (index, plan) in itinerary.days.iter().enumerate() {
        let index = index as DayIndex;
        println!(
            "  [{}] Day {} ({}) {}",
            index, plan.day, plan.date, plan.title
        );
        if let Some(stay) = &plan.stay {
            println!("      stay: {}", stay);
        }
        let notes = journal.state().notes.day(index).len();
        let totals = journal.total_for_day(index);
        if notes > 0 || totals != Totals::default() {
            println!("      {} notes, spent {}", notes, format_totals(&totals));
        }
    }
    println!("\nTrip total: {}", format_totals(&journal.grand_total()));

    Ok(())
}

pub fn handle_note_add(day: DayIndex, json: bool) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;

    let id = match journal.add_note() {
        Ok(id) => id,
        Err(e) => return report(Err(e)),
    };

    if json {
        if let Some(note) = journal.note(id) {
            println!("{}", serde_json::to_string_pretty(note)?);
        }
    } else {
        println!("Created note {} on day {}", id, journal.active_day());
    }

    warn_on_usage(&journal)
}

pub fn handle_note_edit(day: DayIndex, id: u64, text: Option<String>, stdin: bool) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;
    require_note(&journal, id)?;

    let text = if stdin {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        content.trim_end_matches('\n').to_string()
    } else {
        text.unwrap_or_default()
    };

    report(journal.update_text(id, text))?;
    println!("Updated note {}", id);
    warn_on_usage(&journal)
}

pub fn handle_note_attach(day: DayIndex, id: u64, files: Vec<PathBuf>) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;
    require_note(&journal, id)?;

    if files.len() > 1 {
        eprintln!(
            "Note: only the first file ({}) is attached",
            files[0].display()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(journal.attach_image_file(id, &files));

    match result {
        Ok(()) => {
            if let Some(image) = journal.note(id).and_then(|n| n.image.as_ref()) {
                let (width, height) = image.dimensions()?;
                println!(
                    "Attached photo to note {} ({}x{}, {:.1}KB)",
                    id,
                    width,
                    height,
                    image.len() as f64 / 1024.0
                );
            }
        }
        Err(e) => report(Err(e))?,
    }

    warn_on_usage(&journal)
}

pub fn handle_note_detach(day: DayIndex, id: u64) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;
    require_note(&journal, id)?;

    report(journal.remove_image(id))?;
    println!("Removed photo from note {}", id);
    Ok(())
}

pub fn handle_note_delete(day: DayIndex, id: u64) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;
    require_note(&journal, id)?;

    report(journal.delete_note(id))?;
    println!("Deleted note {}", id);
    Ok(())
}

pub fn handle_note_list(day: DayIndex, json: bool) -> Result<()> {
    let (journal, itinerary) = open_journal(day, None)?;
    let notes = journal.notes();

    if json {
        println!("{}", serde_json::to_string_pretty(&*notes)?);
        return Ok(());
    }

    let heading = itinerary
        .day(journal.active_day())
        .map(|plan| format!("Day {} ({}) {}", plan.day, plan.date, plan.title))
        .unwrap_or_else(|| format!("Day index {}", journal.active_day()));

    if notes.is_empty() {
        println!("No notes for {}.", heading);
    } else {
        println!("Notes for {}:\n", heading);
        for note in notes.iter() {
            println!("  {} {}", note.id, note_summary(note));
        }
    }
    Ok(())
}

pub fn handle_expense_add(
    day: DayIndex,
    rate: Option<ExchangeRate>,
    item: String,
    amount: String,
    currency: Currency,
    json: bool,
) -> Result<()> {
    let (mut journal, _) = open_journal(day, rate)?;

    let id = match journal.add_expense(&item, &amount, currency) {
        Ok(id) => id,
        Err(e) => return report(Err(e)),
    };

    if let Some(expense) = journal.expense(id) {
        if json {
            println!("{}", serde_json::to_string_pretty(expense)?);
        } else {
            println!(
                "Recorded expense {}: {} {}",
                id,
                expense.item,
                format_amount(expense)
            );
        }
    }
    println!("Day total: {}", format_totals(&journal.daily_total()));

    warn_on_usage(&journal)
}

pub fn handle_expense_delete(day: DayIndex, id: u64) -> Result<()> {
    let (mut journal, _) = open_journal(day, None)?;
    if journal.expense(id).is_none() {
        return Err(TripbookError::RecordNotFound {
            kind: "expense",
            id,
            day: journal.active_day(),
        });
    }

    report(journal.delete_expense(id))?;
    println!("Deleted expense {}", id);
    Ok(())
}

pub fn handle_expense_list(day: DayIndex, rate: Option<ExchangeRate>, json: bool) -> Result<()> {
    let (journal, _) = open_journal(day, rate)?;
    let expenses = journal.expenses();

    if json {
        println!("{}", serde_json::to_string_pretty(&*expenses)?);
        return Ok(());
    }

    if expenses.is_empty() {
        println!("No expenses for day {}.", journal.active_day());
    } else {
        println!("Expenses for day {}:\n", journal.active_day());
        for expense in expenses.iter() {
            println!(
                "  {} {} {}",
                expense.id,
                expense.item,
                format_amount(expense)
            );
        }
    }
    println!(
        "\nDay total: {} (rate {})",
        format_totals(&journal.daily_total()),
        journal.rate()
    );
    Ok(())
}

pub fn handle_total(day: DayIndex, rate: Option<ExchangeRate>, all: bool, json: bool) -> Result<()> {
    let (journal, _) = open_journal(day, rate)?;
    let totals = if all {
        journal.grand_total()
    } else {
        journal.daily_total()
    };

    if json {
        #[derive(Serialize)]
        struct TotalJson {
            scope: String,
            rate: ExchangeRate,
            jpy: i64,
            twd: i64,
        }

        let scope = if all {
            "all".to_string()
        } else {
            journal.active_day().to_string()
        };
        let out = TotalJson {
            scope,
            rate: journal.rate(),
            jpy: totals.jpy,
            twd: totals.twd,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if all {
        println!("Trip total: {}", format_totals(&totals));
    } else {
        println!(
            "Day {} total: {}",
            journal.active_day(),
            format_totals(&totals)
        );
    }
    Ok(())
}

pub fn handle_reset(force: bool) -> Result<()> {
    let (mut journal, _) = open_journal(0, None)?;

    // Confirm unless --force is used
    if !force {
        eprintln!("Delete ALL notes, photos and expenses? This cannot be undone. [y/N] ");

        // Check if stdin is a tty for interactive confirmation
        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(TripbookError::Storage(
                "Use --force to reset in non-interactive mode".to_string(),
            ));
        }
    }

    journal.reset()?;
    println!("Cleared all notes, photos and expenses.");
    Ok(())
}
