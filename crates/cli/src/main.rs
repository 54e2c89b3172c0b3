use anyhow::Result;
use board_core::config::BoardConfig;
use board_core::roster::{self, Roster};
use board_core::schema::{
    NewResolution, ResolutionPatch, ResolutionStatus, SignatureMethod, SignatureRequest,
    VotingType,
};
use board_core::{
    BoardError, BoardResult, Caller, SqliteStore, ledger, lifecycle, signatures, validation,
};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "boardroom")]
#[command(about = "Board resolution voting and e-signature CLI", long_about = None)]
struct Cli {
    /// Config file (default: ./boardroom.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path, overrides the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Board member acting on this request
    #[arg(long, visible_alias = "as", env = "BOARDROOM_MEMBER", global = true)]
    member: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Import organizations, meetings and board members
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },
    /// Draft, open, close and inspect resolutions
    Resolution {
        #[command(subcommand)]
        command: ResolutionCommands,
    },
    /// Cast, retract and list votes
    Vote {
        #[command(subcommand)]
        command: VoteCommands,
    },
    /// Sign passed resolutions and list signatures
    Signature {
        #[command(subcommand)]
        command: SignatureCommands,
    },
    /// Render the audit trail as an Obsidian vault
    Vault {
        #[command(subcommand)]
        command: VaultCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum RosterCommands {
    /// Upsert a YAML roster into the database
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum ResolutionCommands {
    /// Draft a new resolution for a meeting
    Create {
        #[arg(long)]
        meeting: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// simple_majority, two_thirds or unanimous
        #[arg(long, default_value = "simple_majority")]
        voting_type: String,
    },
    /// Edit title, description or voting type of a non-terminal resolution
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        voting_type: Option<String>,
    },
    /// Delete a draft
    Delete { id: String },
    /// Open a draft for voting
    Open { id: String },
    /// Close voting and record the result
    Close { id: String },
    /// Show a resolution with its current tally
    Show { id: String },
    /// List resolutions in the caller's organization
    List {
        #[arg(long)]
        meeting: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand)]
enum VoteCommands {
    /// Cast or change your vote
    Cast {
        resolution: String,
        /// approve, reject or abstain
        vote: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Withdraw your vote while voting is open
    Retract { resolution: String },
    /// List votes with the computed summary
    List { resolution: String },
}

#[derive(Subcommand)]
enum SignatureCommands {
    /// Sign a passed resolution
    Sign {
        resolution: String,
        /// drawn, typed or uploaded
        #[arg(long = "type", default_value = "typed")]
        signature_type: String,
        #[arg(long)]
        typed_name: Option<String>,
        /// Signature image as a data URL
        #[arg(long)]
        data: Option<String>,
        #[arg(long)]
        ip_address: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Audit view of all signatures
    List { resolution: String },
}

#[derive(Subcommand)]
enum VaultCommands {
    /// Write resolution notes and index
    Build {
        #[arg(long, default_value = "vault")]
        out_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
    message: String,
}

impl<'a> From<&'a BoardError> for ErrorBody<'a> {
    fn from(err: &'a BoardError) -> Self {
        let field = match err {
            BoardError::ValidationFailed { field, .. } => Some(*field),
            _ => None,
        };
        Self {
            error: err.kind(),
            field,
            message: err.to_string(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match BoardConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &BoardConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Typed failures go to stdout as JSON; anything else is a plain error on stderr.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<BoardError>() {
        Some(board_err) => {
            match serde_json::to_string_pretty(&ErrorBody::from(board_err)) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("{board_err}"),
            }
        }
        None => eprintln!("error: {err:#}"),
    }
}

fn run(cli: Cli, config: BoardConfig) -> Result<()> {
    let Cli {
        db, member, command, ..
    } = cli;
    let db_path = db.unwrap_or_else(|| config.database.path.clone());
    tracing::debug!(path = %db_path.display(), "using database");
    let connect = || SqliteStore::open(&db_path, config.database.busy_timeout());
    let session = || -> Result<(SqliteStore, Caller)> {
        let store = connect()?;
        let caller = Caller::authenticate(&store, member.as_deref())?;
        Ok((store, caller))
    };

    match command {
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(&out_dir),
        },
        Commands::Roster { command } => match command {
            RosterCommands::Import { file } => {
                let store = connect()?;
                let counts = roster::import(&store, &Roster::load(&file)?)?;
                println!(
                    "Imported {} organizations, {} meetings, {} board members",
                    counts.organizations, counts.meetings, counts.members
                );
                Ok(())
            }
        },
        Commands::Resolution { command } => {
            let (store, caller) = session()?;
            resolution_command(&store, &caller, command)
        }
        Commands::Vote { command } => {
            let (store, caller) = session()?;
            vote_command(&store, &caller, command)
        }
        Commands::Signature { command } => {
            let (store, caller) = session()?;
            signature_command(&store, &caller, command)
        }
        Commands::Vault { command } => match command {
            VaultCommands::Build { out_dir } => {
                let (store, caller) = session()?;
                let report = obsidian::build_vault(&store, &caller, &out_dir)?;
                println!(
                    "Wrote {} resolutions ({} votes, {} signatures) to {}",
                    report.resolutions,
                    report.votes,
                    report.signatures,
                    out_dir.display()
                );
                Ok(())
            }
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn voting_type(raw: &str) -> BoardResult<VotingType> {
    Ok(raw.parse()?)
}

fn resolution_command(
    store: &SqliteStore,
    caller: &Caller,
    command: ResolutionCommands,
) -> Result<()> {
    match command {
        ResolutionCommands::Create {
            meeting,
            title,
            description,
            voting_type: raw_type,
        } => {
            let input = NewResolution {
                meeting_id: meeting,
                title,
                description,
                voting_type: voting_type(&raw_type)?,
            };
            print_json(&lifecycle::create(store, caller, input)?)
        }
        ResolutionCommands::Update {
            id,
            title,
            description,
            voting_type: raw_type,
        } => {
            let patch = ResolutionPatch {
                title,
                description,
                voting_type: raw_type.as_deref().map(voting_type).transpose()?,
            };
            print_json(&lifecycle::update_metadata(store, caller, &id, patch)?)
        }
        ResolutionCommands::Delete { id } => {
            lifecycle::delete(store, caller, &id)?;
            println!("Deleted draft resolution {id}");
            Ok(())
        }
        ResolutionCommands::Open { id } => print_json(&lifecycle::open(store, caller, &id)?),
        ResolutionCommands::Close { id } => print_json(&lifecycle::close(store, caller, &id)?),
        ResolutionCommands::Show { id } => print_json(&lifecycle::get(store, caller, &id)?),
        ResolutionCommands::List { meeting, status } => {
            let status = status
                .as_deref()
                .map(str::parse::<ResolutionStatus>)
                .transpose()
                .map_err(BoardError::from)?;
            print_json(&lifecycle::list(store, caller, meeting.as_deref(), status)?)
        }
    }
}

fn vote_command(store: &SqliteStore, caller: &Caller, command: VoteCommands) -> Result<()> {
    match command {
        VoteCommands::Cast {
            resolution,
            vote,
            comment,
        } => {
            let choice = validation::vote_choice(vote.as_deref())?;
            print_json(&ledger::cast(store, caller, &resolution, choice, comment)?)
        }
        VoteCommands::Retract { resolution } => {
            let removed = ledger::retract(store, caller, &resolution)?;
            print_json(&serde_json::json!({
                "resolution_id": resolution,
                "retracted": removed,
            }))
        }
        VoteCommands::List { resolution } => print_json(&ledger::list(store, caller, &resolution)?),
    }
}

fn signature_command(
    store: &SqliteStore,
    caller: &Caller,
    command: SignatureCommands,
) -> Result<()> {
    match command {
        SignatureCommands::Sign {
            resolution,
            signature_type,
            typed_name,
            data,
            ip_address,
            user_agent,
        } => {
            let request = SignatureRequest {
                signature_type: signature_type
                    .parse::<SignatureMethod>()
                    .map_err(BoardError::from)?,
                signature_data: data,
                typed_name,
                ip_address,
                user_agent,
            };
            print_json(&signatures::sign(store, caller, &resolution, request)?)
        }
        SignatureCommands::List { resolution } => {
            print_json(&signatures::list(store, caller, &resolution)?)
        }
    }
}

fn schema_export(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    let schemas = [
        ("Resolution", schema_for!(board_core::schema::Resolution)),
        ("Vote", schema_for!(board_core::schema::Vote)),
        ("Signature", schema_for!(board_core::schema::Signature)),
        ("VoteSummary", schema_for!(board_core::schema::VoteSummary)),
        ("BoardMember", schema_for!(board_core::schema::BoardMember)),
    ];
    for (name, schema) in schemas {
        let json = serde_json::to_string_pretty(&schema)?;
        fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    }

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
