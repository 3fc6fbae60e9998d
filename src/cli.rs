use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::board::Filters;
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::summary::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::summary::{OpenAiClient, OpenAiConfig, SummaryService};
use crate::types::{Priority, Status, TicketDraft};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    /// Directory holding the stored board (defaults to the platform data dir)
    #[arg(long, env = "BOARD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the summarization endpoint over HTTP
    Serve(ServeArgs),
    /// Show the board as columns
    Board(FilterArgs),
    /// List tickets matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print one ticket as JSON
    Show { id: String },
    /// Total, urgent and due-soon counts
    Stats,
    /// Distinct assignees, priorities, labels and statuses
    Facets,
    /// Create a ticket (--title is required)
    Add(TicketFields),
    /// Edit a ticket; omitted fields keep their current value
    Update {
        id: String,
        #[command(flatten)]
        fields: TicketFields,
    },
    /// Move a ticket to another column
    Move { id: String, status: Status },
    /// Delete a ticket
    Remove { id: String },
    /// Remove a label from a ticket
    Unlabel { id: String, label: String },
    /// Delete every ticket and the stored board
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Write the board to a JSON file
    Export {
        /// Output path (defaults to board-export-<date>.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace the board with the tickets in an exported JSON file
    Import { path: PathBuf },
    /// Summarize the stored board
    Summary(RemoteArgs),
    /// Print JSON schemas for the export file and the summary endpoint
    Schema,
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text in title, description or labels
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long)]
    pub status: Option<Status>,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters {
            search: args.search.unwrap_or_default(),
            assignee: args.assignee.unwrap_or_default(),
            priority: args.priority,
            label: args.label.unwrap_or_default(),
            status: args.status,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TicketFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<Status>,
    #[arg(long)]
    pub priority: Option<Priority>,
    #[arg(long)]
    pub assignee: Option<String>,
    /// Repeat for several labels; replaces the existing labels
    #[arg(long = "label")]
    pub labels: Option<Vec<String>>,
    /// Due date, e.g. 2026-10-31
    #[arg(long = "due")]
    pub due_date: Option<String>,
    /// Estimate in hours
    #[arg(long)]
    pub estimate: Option<u32>,
}

impl TicketFields {
    /// Overlay the given fields onto `draft`.
    pub fn apply(self, draft: &mut TicketDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(priority) = self.priority {
            draft.priority = priority;
        }
        if let Some(assignee) = self.assignee {
            draft.assignee = assignee;
        }
        if let Some(labels) = self.labels {
            draft.labels = labels;
        }
        if let Some(due_date) = self.due_date {
            draft.due_date = due_date;
        }
        if let Some(estimate) = self.estimate {
            draft.estimate = estimate;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// HTTP bind address
    #[arg(long, env = "BOARD_HTTP_ADDR", default_value = "127.0.0.1:3000")]
    pub http_addr: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl ServeArgs {
    pub fn validate(&self) -> Result<SocketAddr, String> {
        self.remote.validate()?;
        self.http_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BOARD_HTTP_ADDR '{}': {e}", self.http_addr))
    }
}

#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// API key for the remote summarizer; without it summaries are local
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// Timeout for the remote summarizer call, in seconds
    #[arg(long, env = "BOARD_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Default for RemoteArgs {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl RemoteArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.openai_base_url.starts_with("http://")
            && !self.openai_base_url.starts_with("https://")
        {
            return Err(format!(
                "Invalid OPENAI_BASE_URL '{}': expected an http(s) URL",
                self.openai_base_url
            ));
        }
        if self.openai_model.trim().is_empty() {
            return Err("OPENAI_MODEL cannot be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("BOARD_REQUEST_TIMEOUT_SECS must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn summary_service(&self) -> SummaryService {
        let client = OpenAiClient::new(OpenAiConfig {
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        });
        SummaryService::new(self.openai_api_key.clone(), Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filters_and_ticket_fields() {
        let cli = Cli::try_parse_from([
            "ticket-board",
            "list",
            "--priority",
            "urgent",
            "--status",
            "in-progress",
            "-s",
            "login",
        ])
        .unwrap();
        let Command::List { filters, json } = cli.command else {
            panic!("expected list");
        };
        assert!(!json);
        let filters = Filters::from(filters);
        assert_eq!(filters.priority, Some(Priority::Urgent));
        assert_eq!(filters.status, Some(Status::InProgress));
        assert_eq!(filters.search, "login");
        assert!(filters.assignee.is_empty());

        let cli = Cli::try_parse_from([
            "ticket-board",
            "add",
            "--title",
            "Ship",
            "--label",
            "a",
            "--label",
            "b",
        ])
        .unwrap();
        let Command::Add(fields) = cli.command else {
            panic!("expected add");
        };
        let mut draft = TicketDraft::new("");
        fields.apply(&mut draft);
        assert_eq!(draft.title, "Ship");
        assert_eq!(draft.labels, ["a", "b"]);
        assert_eq!(draft.priority, Priority::Medium);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["ticket-board", "move", "1", "archived"]).is_err());
    }

    #[test]
    fn validates_serve_args() {
        let mut args = ServeArgs {
            http_addr: "127.0.0.1:3000".to_string(),
            remote: RemoteArgs::default(),
        };
        assert!(args.validate().is_ok());

        args.http_addr = "localhost".to_string();
        assert!(args.validate().is_err());

        args.http_addr = "127.0.0.1:0".to_string();
        args.remote.openai_base_url = "api.openai.com".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn blank_key_means_no_credential() {
        let args = RemoteArgs {
            openai_api_key: Some(String::new()),
            ..RemoteArgs::default()
        };
        assert!(!args.summary_service().has_credential());
    }
}
