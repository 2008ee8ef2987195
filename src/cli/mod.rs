pub mod commands;
pub mod context;
pub mod output;

use clap::{Args, Parser, Subcommand};

/// Audit trail recorder for the CLAIR resident-care application.
#[derive(Parser, Debug)]
#[command(name = "clair", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the clair directory (default: .clair)
    #[arg(long, global = true, env = "CLAIR_DIR")]
    pub dir: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the clair directory with a default configuration
    Init,

    /// Record one audited action
    Record {
        #[command(flatten)]
        actor: ActorArgs,

        /// Action performed (create, update, delete, view, ...)
        #[arg(long)]
        action: String,
        /// Resource type affected (patient, report, ...)
        #[arg(long)]
        entity: String,
        /// Resource instance affected
        #[arg(long)]
        entity_id: Option<String>,
        /// Human-readable description
        #[arg(long)]
        description: String,
        /// Functional area issuing the entry
        #[arg(long)]
        module: String,
        /// low, medium, high or critical (default: low)
        #[arg(long)]
        severity: Option<String>,
        /// Snapshot before the change: inline JSON object or @file
        #[arg(long)]
        previous: Option<String>,
        /// Snapshot after the change: inline JSON object or @file
        #[arg(long)]
        new: Option<String>,
        /// Mark the action as failed
        #[arg(long)]
        failed: bool,
        /// Error message for a failed action
        #[arg(long)]
        error: Option<String>,
        /// Elapsed time in milliseconds
        #[arg(long)]
        duration: Option<u64>,
        /// Extra context as key=value. Repeatable
        #[arg(long = "meta")]
        meta: Vec<String>,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Record a login, logout or login attempt
    Auth {
        /// login, logout or login_attempt
        action: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// The attempt failed
        #[arg(long)]
        failed: bool,
        /// Reason for the failure
        #[arg(long)]
        error: Option<String>,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Record an operation applied to many resources at once
    Bulk {
        /// update or delete
        operation: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Resource type affected
        #[arg(long)]
        entity: String,
        /// Comma-separated ids of the affected resources
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        /// Human-readable description
        #[arg(long)]
        description: String,
        /// Functional area issuing the entry
        #[arg(long)]
        module: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Show audit entries, newest first
    Log {
        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum entries to show
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
        limit: u64,
        /// Entries to skip before the first one shown
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show activity totals for a date range
    Summary {
        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        since: Option<String>,
        /// End date, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        until: Option<String>,
        /// Print the raw summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export audit entries as CSV or JSON
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// csv or json
        #[arg(long, default_value = "csv")]
        format: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Import entries from a JSON export
    Import {
        /// File produced by 'clair export --format json'
        file: String,
    },

    /// Show which fields differ between two JSON snapshots
    Diff {
        /// Snapshot before the change
        before: String,
        /// Snapshot after the change
        after: String,
    },

    /// Show configuration and audit log status
    Status,
}

/// Who performed the action.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// User id (omit for system events)
    #[arg(long)]
    pub user_id: Option<String>,
    /// User role
    #[arg(long, default_value = "system")]
    pub role: String,
    /// User display name
    #[arg(long, default_value = "system")]
    pub name: String,
    /// Employee number
    #[arg(long)]
    pub employee_number: Option<String>,
    /// Temporary or substitute staff
    #[arg(long)]
    pub replacement: bool,
    /// Session id
    #[arg(long)]
    pub session: Option<String>,
}

/// Inbound request headers, used for client address and user agent.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Request header as "name: value". Repeatable
    #[arg(long = "header")]
    pub headers: Vec<String>,
}

/// Criteria shared by `log` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Entries at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub since: Option<String>,
    /// Entries at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub until: Option<String>,
    /// Filter by user id
    #[arg(long)]
    pub user_id: Option<String>,
    /// Filter by user role
    #[arg(long)]
    pub role: Option<String>,
    /// Filter by action
    #[arg(long)]
    pub action: Option<String>,
    /// Filter by entity
    #[arg(long)]
    pub entity: Option<String>,
    /// Filter by module
    #[arg(long)]
    pub module: Option<String>,
    /// Filter by severity
    #[arg(long)]
    pub severity: Option<String>,
    /// Only failed actions
    #[arg(long, conflicts_with = "succeeded")]
    pub failed: bool,
    /// Only successful actions
    #[arg(long)]
    pub succeeded: bool,
}
