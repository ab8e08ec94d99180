use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "shelfmark",
    about = "Shelfmark: ISBN block and schedule assignment over a shared registry store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty registry store
    Init {
        /// Store path to initialize
        #[arg(default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register a purchased identifier range
    AddBlock {
        /// EAN prefix (3 digits, e.g. 978)
        #[arg(long)]
        prefix: String,

        /// Registrant code issued with the range
        #[arg(long)]
        publisher_code: String,

        /// First title-sequence number (inclusive)
        #[arg(long)]
        start: u64,

        /// Last title-sequence number (inclusive)
        #[arg(long)]
        end: u64,

        /// Explicit block id (default: next free blk-N)
        #[arg(long)]
        id: Option<String>,

        /// Owning publisher
        #[arg(long, default_value = "")]
        publisher: String,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Schedule one book, allocating or updating its identifier
    Schedule {
        /// Book title
        #[arg(long)]
        title: String,

        /// Caller-supplied book key
        #[arg(long)]
        book_id: String,

        /// Scheduled date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Manual identifier (hyphens allowed); omit to auto-allocate
        #[arg(long)]
        isbn: Option<String>,

        /// Block to allocate from
        #[arg(long)]
        block: Option<String>,

        /// Imprint
        #[arg(long, default_value = "")]
        imprint: String,

        /// Publisher
        #[arg(long, default_value = "")]
        publisher: String,

        /// Format (hardback, paperback, ebook, ...)
        #[arg(long, default_value = "")]
        format: String,

        /// Priority (0..4)
        #[arg(long, default_value_t = 2)]
        priority: i32,

        /// Notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Confirm a scheduled or reserved identifier as final
    Assign {
        /// Identifier or book id
        key: String,

        /// Assignment date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Idempotent allocate-or-reuse: rebuilds keep their identifier
    GetOrAssign {
        /// Caller-supplied book key
        #[arg(long)]
        book_id: String,

        /// Book title
        #[arg(long, default_value = "")]
        title: String,

        /// Scheduled date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Manual identifier; omit to auto-allocate
        #[arg(long)]
        isbn: Option<String>,

        /// Block to allocate from
        #[arg(long)]
        block: Option<String>,

        /// Imprint
        #[arg(long, default_value = "")]
        imprint: String,

        /// Publisher
        #[arg(long, default_value = "")]
        publisher: String,

        /// Format
        #[arg(long, default_value = "")]
        format: String,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up an existing record by book id or identifier
    Lookup {
        /// Book id to look up
        #[arg(long)]
        book_id: Option<String>,

        /// Identifier to look up
        #[arg(long)]
        isbn: Option<String>,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Protect an identifier for a future, not-yet-named project
    Reserve {
        /// Identifier to reserve
        #[arg(long)]
        isbn: String,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Return an identifier to the available pool
    Release {
        /// Identifier to release
        #[arg(long)]
        isbn: String,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bulk import schedule rows from CSV or JSON
    ImportSchedule {
        /// Rows file (.csv or .json)
        #[arg(long)]
        file: String,

        /// Input format override (default: extension, then content sniff)
        #[arg(long, value_enum)]
        format: Option<ImportFormatArg>,

        /// Print each failed row to stderr
        #[arg(long)]
        show_errors: bool,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List assignments with optional filters
    List {
        /// Only the next N records by scheduled date, today onward
        #[arg(long)]
        upcoming: Option<usize>,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by block id
        #[arg(long)]
        block: Option<String>,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Availability and utilization report
    Report {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormatArg,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,
    },

    /// Export the full assignment table
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormatArg,

        /// Path to the registry store
        #[arg(long, default_value = ".shelfmark/registry.json")]
        store: String,
    },
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ImportFormatArg {
    #[value(name = "csv")]
    Csv,
    #[value(name = "json")]
    Json,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ReportFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
    #[value(name = "csv")]
    Csv,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ExportFormatArg {
    #[value(name = "json")]
    Json,
    #[value(name = "csv")]
    Csv,
}
