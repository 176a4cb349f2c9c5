//! Tally CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! tally-cli migrate
//!
//! # Bootstrap a company and its first admin
//! tally-cli company create -n "Acme" --subject auth0|123 -e ada@acme.test --first-name Ada
//!
//! # Add a member without an invitation
//! tally-cli member create -c 1 --subject auth0|456 -e bob@acme.test --first-name Bob -r employee
//!
//! # Issue an invitation and print the accept link
//! tally-cli invite create -c 1 --inviter 1 -e carol@acme.test -r manager
//!
//! # Show the pay period containing a date (defaults to today)
//! tally-cli period show --date 2024-02-20
//! ```
//!
//! # Environment Variables
//!
//! - `TALLY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `TALLY_BASE_URL` - used to build invitation links

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tally-cli")]
#[command(author, version, about = "Tally operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage companies
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },
    /// Manage members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Manage invitations
    Invite {
        #[command(subcommand)]
        action: InviteAction,
    },
    /// Inspect pay periods
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },
}

#[derive(Subcommand)]
enum CompanyAction {
    /// Create a company with its founding admin
    Create {
        /// Company name
        #[arg(short, long)]
        name: String,

        /// Identity-provider subject of the admin
        #[arg(long)]
        subject: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    /// Add a member to a company directly
    Create {
        /// Company ID
        #[arg(short, long)]
        company: i32,

        /// Identity-provider subject
        #[arg(long)]
        subject: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        /// Role (`admin`, `manager`, `employee`)
        #[arg(short, long, default_value = "employee")]
        role: String,

        /// Manager's member ID
        #[arg(long)]
        manager: Option<i32>,
    },
}

#[derive(Subcommand)]
enum InviteAction {
    /// Issue an invitation on behalf of a member
    Create {
        /// Company ID
        #[arg(short, long)]
        company: i32,

        /// Member ID of the inviter
        #[arg(long)]
        inviter: i32,

        /// Email address to invite
        #[arg(short, long)]
        email: String,

        /// Role (`manager` or `employee`)
        #[arg(short, long, default_value = "employee")]
        role: String,
    },
}

#[derive(Subcommand)]
enum PeriodAction {
    /// Show the pay period containing a date
    Show {
        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Company { action } => match action {
            CompanyAction::Create {
                name,
                subject,
                email,
                first_name,
                last_name,
            } => {
                commands::company::create(&name, &subject, &email, &first_name, &last_name)
                    .await?;
            }
        },
        Commands::Member { action } => match action {
            MemberAction::Create {
                company,
                subject,
                email,
                first_name,
                last_name,
                role,
                manager,
            } => {
                let profile = commands::ProfileArgs {
                    subject,
                    email,
                    first_name,
                    last_name,
                };
                commands::member::create(company, profile, &role, manager).await?;
            }
        },
        Commands::Invite { action } => match action {
            InviteAction::Create {
                company,
                inviter,
                email,
                role,
            } => {
                commands::invite::create(company, inviter, &email, &role).await?;
            }
        },
        Commands::Period { action } => match action {
            PeriodAction::Show { date } => commands::period::show(date),
        },
    }
    Ok(())
}
