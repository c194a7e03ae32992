use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "shopadmin", version, about = "Shop administration client")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "API_BASE_URL")]
    pub base_url: Option<String>,

    /// Where the session is persisted
    #[arg(long, global = true, env = "SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with a username or email
    Login {
        identifier: String,
        #[arg(short, long, env = "SHOPADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "SHOPADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the stored session
    Logout,
    /// Show the stored session and token claims
    Whoami {
        /// Re-fetch the profile from the server
        #[arg(long, default_value_t = false)]
        refresh: bool,
    },
    /// Administrator commands
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Product catalog
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },
    /// CSV batch import
    Batch {
        #[command(subcommand)]
        command: BatchCommand,
    },
    /// Supplier onboarding
    Supplier {
        #[command(subcommand)]
        command: SupplierCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    Login {
        username: String,
        #[arg(short, long, env = "SHOPADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "SHOPADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "ADMIN_SECRET", hide_env_values = true)]
        admin_secret: String,
    },
    /// List all accounts
    Users,
    DeleteUser { id: i64 },
    /// Supplier applications awaiting review
    Applications {
        /// PENDING, APPROVED or REJECTED
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Approve or reject an application
    Review {
        id: i64,
        /// APPROVE or REJECT
        decision: String,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub size: u32,
    #[arg(long, default_value = "name,asc")]
    pub sort: String,
}

#[derive(Args, Debug, Clone)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub price: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub stock: Option<String>,
    /// Image to attach (sent as multipart)
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get { id: i64 },
    Create {
        #[command(flatten)]
        product: ProductArgs,
        /// Create on behalf of another seller
        #[arg(long)]
        seller: Option<String>,
    },
    Update {
        id: i64,
        #[command(flatten)]
        product: ProductArgs,
    },
    Delete { id: i64 },
    /// Products supplied by the current supplier
    Supplied {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Products owned by the current user
    Mine {
        #[command(flatten)]
        page: PageArgs,
    },
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Upload a CSV and follow the import job
    Upload {
        file: PathBuf,
        /// Return right after the upload is accepted
        #[arg(long, default_value_t = false)]
        no_wait: bool,
    },
    Status { job_id: i64 },
    /// Download the sample CSV
    Template {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SupplierCommand {
    Dashboard,
    Apply {
        #[arg(long)]
        business_name: String,
        #[arg(long)]
        business_email: String,
        #[arg(long)]
        business_phone: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// Applications submitted by the current user
    Applications,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login() {
        let cli = Cli::parse_from(["shopadmin", "login", "alice@example.com", "-p", "pw"]);
        match cli.command {
            Commands::Login { identifier, password } => {
                assert_eq!(identifier, "alice@example.com");
                assert_eq!(password, "pw");
            }
            _ => panic!("Expected login"),
        }
    }

    #[test]
    fn test_parse_products_list_defaults() {
        let cli = Cli::parse_from(["shopadmin", "--json", "products", "list"]);
        assert!(cli.json);
        match cli.command {
            Commands::Products {
                command: ProductCommand::List { page },
            } => {
                assert_eq!(page.page, 0);
                assert_eq!(page.size, 20);
                assert_eq!(page.sort, "name,asc");
            }
            _ => panic!("Expected products list"),
        }
    }

    #[test]
    fn test_parse_admin_review() {
        let cli = Cli::parse_from([
            "shopadmin", "admin", "review", "7", "approve", "--note", "ok",
        ]);
        match cli.command {
            Commands::Admin {
                command: AdminCommand::Review { id, decision, note },
            } => {
                assert_eq!(id, 7);
                assert_eq!(decision, "approve");
                assert_eq!(note.as_deref(), Some("ok"));
            }
            _ => panic!("Expected admin review"),
        }
    }

    #[test]
    fn test_parse_batch_upload_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "shopadmin", "batch", "upload", "items.csv", "--base-url", "http://h:1",
        ]);
        assert_eq!(cli.base_url.as_deref(), Some("http://h:1"));
        assert!(matches!(
            cli.command,
            Commands::Batch {
                command: BatchCommand::Upload { no_wait: false, .. }
            }
        ));
    }
}
