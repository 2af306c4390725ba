use clap::{Parser, Subcommand};

/// EDL Admin — approve or reject URL unblock requests
#[derive(Parser)]
#[command(name = "edl-admin", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the admin web server
    Serve {
        /// Port to bind (defaults to EDL_ADMIN_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage pending unblock requests
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },

    /// Inspect the External Dynamic List
    Edl {
        #[command(subcommand)]
        command: EdlCommands,
    },
}

#[derive(Subcommand)]
pub enum RequestCommands {
    /// List pending requests
    List,
    /// Accept a request and add its URL to the EDL
    Accept { request_id: String },
    /// Reject a request
    Reject { request_id: String },
    /// Submit a new unblock request
    Submit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

#[derive(Subcommand)]
pub enum EdlCommands {
    /// Print every URL in the EDL
    List,
}
