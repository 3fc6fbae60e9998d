use std::path::PathBuf;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use dialoguer::Confirm;
use serde_json::json;

use crate::board::{
    BoardStore, DueState, ExportDocument, Facets, Filters, Stats, columns, due_state,
    export_filename, facets, filter_tickets, stats,
};
use crate::cli::{Cli, Command, TicketFields};
use crate::clock::SystemClock;
use crate::error::{ServiceError, ServiceResult};
use crate::metadata::{PKG_NAME, PKG_VERSION};
use crate::server;
use crate::storage::{ByteStore, FileStore};
use crate::summary::{SummaryRequest, SummaryResponse};
use crate::types::{Priority, Ticket, TicketDraft};

pub async fn run(cli: Cli) -> ServiceResult<()> {
    match cli.command {
        Command::Serve(args) => server::start_server(args).await,
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            Ok(())
        }
        Command::Schema => print_schemas(),
        Command::Summary(args) => {
            args.validate().map_err(ServiceError::Config)?;
            let board = open_board(cli.data_dir)?;
            let service = args.summary_service();
            let request = SummaryRequest::from_tickets(board.tickets())?;
            let result = service.summarize(request.tickets, board.now()).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        command => {
            let mut board = open_board(cli.data_dir)?;
            run_board_command(&mut board, command)
        }
    }
}

fn open_board(data_dir: Option<PathBuf>) -> ServiceResult<BoardStore<FileStore>> {
    let store = match data_dir {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new()?,
    };
    tracing::debug!(dir = %store.dir().display(), "Opening board");
    Ok(BoardStore::load(store, SystemClock))
}

/// Commands that read or mutate the stored board.
pub fn run_board_command<S: ByteStore>(
    board: &mut BoardStore<S>,
    command: Command,
) -> ServiceResult<()> {
    let now = board.now();
    match command {
        Command::Board(filters) => {
            let filters = Filters::from(filters);
            print_columns(&filter_tickets(board.tickets(), &filters), now);
        }
        Command::List { filters, json } => {
            let filters = Filters::from(filters);
            let tickets = filter_tickets(board.tickets(), &filters);
            if json {
                println!("{}", serde_json::to_string_pretty(&tickets)?);
            } else {
                for ticket in tickets {
                    println!("{}", ticket_line(ticket, now));
                }
            }
        }
        Command::Show { id } => {
            let ticket = board.get(&id).ok_or(ServiceError::TicketNotFound(id))?;
            println!("{}", serde_json::to_string_pretty(ticket)?);
        }
        Command::Stats => print_stats(&stats(board.tickets(), now)),
        Command::Facets => print_facets(&facets(board.tickets()))?,
        Command::Add(fields) => {
            let draft = new_draft(fields)?;
            let ticket = board.add(draft)?;
            println!("Created {} {}", ticket.id.dimmed(), ticket.title);
        }
        Command::Update { id, fields } => {
            let mut draft = board
                .get(&id)
                .map(Ticket::to_draft)
                .ok_or_else(|| ServiceError::TicketNotFound(id.clone()))?;
            fields.apply(&mut draft);
            match board.update(&id, draft)? {
                Some(ticket) => println!("Updated {}", ticket_line(&ticket, now)),
                None => return Err(ServiceError::TicketNotFound(id)),
            }
        }
        Command::Move { id, status } => match board.move_to(&id, status)? {
            Some(ticket) => println!("{} is now in {}", ticket.id.dimmed(), status.title()),
            None => println!("No ticket {id}"),
        },
        Command::Remove { id } => {
            if board.remove(&id)? {
                println!("Removed {id}");
            } else {
                println!("No ticket {id}");
            }
        }
        Command::Unlabel { id, label } => {
            if board.remove_label(&id, &label)? {
                println!("Removed label {label} from {id}");
            } else {
                println!("Nothing to remove");
            }
        }
        Command::Clear { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!(
                        "Delete all {} tickets? This cannot be undone",
                        board.tickets().len()
                    ))
                    .default(false)
                    .interact()?;
            if confirmed {
                board.clear()?;
                println!("Board cleared");
            } else {
                println!("Aborted");
            }
        }
        Command::Export { output } => {
            let doc = board.export();
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(now)));
            std::fs::write(&path, doc.to_json()?)?;
            println!(
                "Exported {} tickets to {}",
                doc.tickets.len(),
                path.display()
            );
        }
        Command::Import { path } => {
            let count = board.import_file(&path)?;
            println!("Imported {count} tickets from {}", path.display());
        }
        Command::Serve(_) | Command::Summary(_) | Command::Schema | Command::Version => {
            return Err(ServiceError::FromString(
                "command does not operate on the stored board".to_string(),
            ));
        }
    }
    Ok(())
}

fn new_draft(fields: TicketFields) -> ServiceResult<TicketDraft> {
    let mut draft = TicketDraft::new("");
    fields.apply(&mut draft);
    if draft.title.trim().is_empty() {
        return Err(ServiceError::FromString(
            "a ticket needs a non-empty --title".to_string(),
        ));
    }
    Ok(draft)
}

fn print_schemas() -> ServiceResult<()> {
    let schemas = json!({
        "exportDocument": schemars::schema_for!(ExportDocument),
        "summaryRequest": schemars::schema_for!(SummaryRequest),
        "summaryResponse": schemars::schema_for!(SummaryResponse),
        "filters": schemars::schema_for!(Filters),
        "stats": schemars::schema_for!(Stats),
        "facets": schemars::schema_for!(Facets),
    });
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}

fn print_columns(tickets: &[&Ticket], now: DateTime<Utc>) {
    for column in columns(tickets.iter().copied()) {
        println!(
            "{} {}",
            column.title.bold(),
            format!("({})", column.tickets.len()).dimmed()
        );
        for ticket in column.tickets {
            println!("  {}", ticket_line(ticket, now));
        }
        println!();
    }
}

fn print_stats(s: &Stats) {
    println!(
        "{} {}   {} {}   {} {}",
        "Total".bold(),
        s.total,
        "Urgent".bold(),
        s.urgent_count.to_string().red(),
        "Due soon".bold(),
        s.due_soon_count.to_string().yellow()
    );
}

fn print_facets(f: &Facets) -> ServiceResult<()> {
    println!("{}", serde_json::to_string_pretty(f)?);
    Ok(())
}

fn priority_tag(priority: Priority) -> ColoredString {
    let tag = format!("[{priority}]");
    match priority {
        Priority::Urgent => tag.red().bold(),
        Priority::High => tag.yellow(),
        Priority::Medium => tag.blue(),
        Priority::Low => tag.dimmed(),
    }
}

fn due_tag(ticket: &Ticket, now: DateTime<Utc>) -> ColoredString {
    match due_state(&ticket.due_date, now) {
        Some(DueState::Overdue) => DueState::Overdue.label().red(),
        Some(DueState::DueToday) => DueState::DueToday.label().yellow().bold(),
        Some(DueState::DueSoon) => DueState::DueSoon.label().yellow(),
        Some(DueState::Normal) => ticket.due_date.dimmed(),
        None => "".normal(),
    }
}

fn ticket_line(ticket: &Ticket, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {} {}",
        priority_tag(ticket.priority),
        ticket.title,
        ticket.id.dimmed()
    );
    if !ticket.assignee.is_empty() {
        line.push_str(&format!(" @{}", ticket.assignee));
    }
    if !ticket.labels.is_empty() {
        line.push_str(&format!(" {}", ticket.labels.join(",").cyan()));
    }
    let due = due_tag(ticket, now);
    if !due.is_empty() {
        line.push_str(&format!(" {due}"));
    }
    line
}
