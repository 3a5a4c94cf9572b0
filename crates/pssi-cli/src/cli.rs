use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pssi")]
#[command(about = "PSSI - AI gateway for system care, development and deployment", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of a running PSSI API
    #[arg(long, env = "PSSI_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start API server
    Serve {
        /// Address to bind (overrides PSSI_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PSSI_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Send a prompt through the gateway
    Chat {
        prompt: String,

        /// openai, anthropic or gemini; auto-selected when omitted
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,
    },

    /// Show server and provider health
    Health,

    /// Task automation
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Work with this machine directly, without the API
    Host {
        #[command(subcommand)]
        command: HostCommands,
    },

    /// Show host statistics from the API
    Stats {
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "5000")]
        interval_ms: u64,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Submit a task for analysis
    Submit {
        description: String,

        /// Complete the task when the analysis marks it safe
        #[arg(long)]
        auto_execute: bool,
    },

    /// Show task status
    Status {
        task_id: String,
    },
}

#[derive(Subcommand)]
pub enum HostCommands {
    /// Print a statistics snapshot as JSON
    Stats,

    /// Run a Python task script
    Run {
        name: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
