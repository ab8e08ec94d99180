//! Shelfmark CLI: the `shelfmark` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { store, json } => commands::init::run(store, json),

        Commands::AddBlock {
            prefix,
            publisher_code,
            start,
            end,
            id,
            publisher,
            store,
            json,
        } => commands::add_block::run(prefix, publisher_code, start, end, id, publisher, store, json),

        Commands::Schedule {
            title,
            book_id,
            date,
            isbn,
            block,
            imprint,
            publisher,
            format,
            priority,
            notes,
            store,
            json,
        } => commands::schedule::run(commands::schedule::Args {
            title,
            book_id,
            date,
            isbn,
            block,
            imprint,
            publisher,
            format,
            priority,
            notes,
            store,
            json,
        }),

        Commands::Assign {
            key,
            date,
            store,
            json,
        } => commands::assign::run(key, date, store, json),

        Commands::GetOrAssign {
            book_id,
            title,
            date,
            isbn,
            block,
            imprint,
            publisher,
            format,
            store,
            json,
        } => commands::get_or_assign::run(commands::get_or_assign::Args {
            book_id,
            title,
            date,
            isbn,
            block,
            imprint,
            publisher,
            format,
            store,
            json,
        }),

        Commands::Lookup {
            book_id,
            isbn,
            store,
            json,
        } => commands::lookup::run(book_id, isbn, store, json),

        Commands::Reserve { isbn, store, json } => commands::reserve::run(isbn, store, json),

        Commands::Release { isbn, store, json } => commands::release::run(isbn, store, json),

        Commands::ImportSchedule {
            file,
            format,
            show_errors,
            store,
            json,
        } => commands::import_schedule::run(file, format, show_errors, store, json),

        Commands::List {
            upcoming,
            status,
            block,
            store,
            json,
        } => commands::list::run(commands::list::Args {
            upcoming,
            status,
            block,
            store,
            json,
        }),

        Commands::Report { format, store } => commands::report::run(format, store),

        Commands::Export { format, store } => commands::export::run(format, store),
    }
}
