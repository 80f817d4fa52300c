use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use github_team_provider::config::{
    DEFAULT_BASE_URL, ENV_BASE_URL, ENV_OWNER, ENV_RETRIES, ENV_TOKEN, ENV_WAIT_SECS,
    ProviderConfig,
};
use github_team_provider::github::{OctocrabClient, RetryConfig};
use github_team_provider::reconciler::TeamReconciler;
use github_team_provider::resource::{Refresh, TeamResource};
use github_team_provider::schema::{self, Plan};
use github_team_provider::types::TeamConfig;

/// Manage a GitHub team from a declarative JSON configuration.
#[derive(Debug, Parser)]
#[command(name = "github-team", version)]
struct Cli {
    /// GitHub token with admin:org scope.
    #[arg(long, env = ENV_TOKEN, hide_env_values = true)]
    token: String,

    /// Organization that owns the team.
    #[arg(long, env = ENV_OWNER)]
    owner: String,

    /// API root, e.g. https://ghe.example.com/api/v3 for GitHub Enterprise Server.
    #[arg(long, env = ENV_BASE_URL, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Retries after the first attempt for lookups that may race other appliers.
    #[arg(long, env = ENV_RETRIES, default_value_t = RetryConfig::DEFAULT.max_retries)]
    retries: u32,

    /// Seconds to wait between attempts.
    #[arg(long, env = ENV_WAIT_SECS, default_value_t = RetryConfig::DEFAULT.initial_delay.as_secs())]
    wait_secs: u64,

    /// Resource record file holding id, configuration and observed state.
    #[arg(long, short = 's', default_value = "team.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the team described by a configuration file.
    Create {
        #[arg(long, short = 'c')]
        config: PathBuf,
    },
    /// Refresh the record from GitHub.
    Read,
    /// Update the team, optionally to a new configuration.
    Update {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
    /// Delete the team.
    Delete,
    /// Adopt an existing team by its numeric id.
    Import { id: String },
    /// Show what applying a configuration would change, without calling GitHub.
    Plan {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
    /// Create or update the team as needed.
    Apply {
        #[arg(long, short = 'c')]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "github_team_provider=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli {
        token,
        owner,
        base_url,
        retries,
        wait_secs,
        state,
        command,
    } = Cli::parse();

    let provider = ProviderConfig::new(token, owner)
        .with_base_url(base_url)
        .with_retries(retries)
        .with_wait(Duration::from_secs(wait_secs));
    tracing::debug!(config = ?provider, "loaded provider configuration");

    match command {
        Command::Plan { config } => {
            let mut resource = load_or_new(&state, config.as_deref())?;
            if let Some(path) = config {
                resource.config = read_config(&path)?;
            }
            print_plan(&resource.plan());
        }
        Command::Create { config } => {
            if state.exists() && TeamResource::load(&state)?.exists() {
                bail!("{} already records a team; use update or delete", state.display());
            }
            let mut resource = TeamResource::new(read_config(&config)?);
            let reconciler = connect(&provider).await?;
            resource.create(&reconciler).await?;
            save_and_print(&resource, &state)?;
        }
        Command::Read => {
            let mut resource = load(&state)?;
            let reconciler = connect(&provider).await?;
            match resource.refresh(&reconciler).await? {
                Refresh::Removed => eprintln!("team no longer exists; id cleared"),
                Refresh::Unchanged => eprintln!("team unchanged"),
                Refresh::Absent => eprintln!("record has no team id"),
                Refresh::Updated => {}
            }
            save_and_print(&resource, &state)?;
        }
        Command::Update { config } => {
            let mut resource = load(&state)?;
            if let Some(path) = config {
                resource.config = read_config(&path)?;
            }
            let reconciler = connect(&provider).await?;
            resource.update(&reconciler).await?;
            save_and_print(&resource, &state)?;
        }
        Command::Delete => {
            let mut resource = load(&state)?;
            let reconciler = connect(&provider).await?;
            resource.destroy(&reconciler).await?;
            save_and_print(&resource, &state)?;
        }
        Command::Import { id } => {
            let reconciler = connect(&provider).await?;
            let resource = TeamResource::import(&reconciler, &id).await?;
            save_and_print(&resource, &state)?;
        }
        Command::Apply { config } => {
            let mut resource = load_or_new(&state, Some(&config))?;
            resource.config = read_config(&config)?;
            let reconciler = connect(&provider).await?;
            resource.refresh(&reconciler).await?;
            let plan = resource.apply(&reconciler).await?;
            print_plan(&plan);
            save_and_print(&resource, &state)?;
        }
    }

    Ok(())
}

async fn connect(provider: &ProviderConfig) -> anyhow::Result<TeamReconciler<OctocrabClient>> {
    let client = OctocrabClient::connect(provider.token.clone(), &provider.base_url, &provider.owner)
        .await
        .with_context(|| format!("failed to connect to GitHub as owner {}", provider.owner))?;
    let owner = client.owner().clone();
    Ok(TeamReconciler::with_retry(client, owner, provider.retry_config()))
}

fn load(path: &Path) -> anyhow::Result<TeamResource> {
    TeamResource::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Reads a configuration file holding the team's attributes as a JSON object.
fn read_config(path: &Path) -> anyhow::Result<TeamConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let Some(attrs) = value.as_object() else {
        bail!("{} must contain a JSON object", path.display());
    };
    schema::decode(attrs).with_context(|| format!("invalid configuration in {}", path.display()))
}

fn load_or_new(state: &Path, config: Option<&Path>) -> anyhow::Result<TeamResource> {
    if state.exists() {
        return load(state);
    }
    match config {
        Some(path) => Ok(TeamResource::new(read_config(path)?)),
        None => bail!("{} does not exist and no configuration was given", state.display()),
    }
}

fn save_and_print(resource: &TeamResource, path: &Path) -> anyhow::Result<()> {
    resource
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(resource)?);
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("action: {:?}", plan.action);
    for change in &plan.changes {
        println!("  ~ {}: {:?} -> {:?}", change.field, change.old, change.new);
    }
    for field in &plan.recomputed {
        println!("  ~ {}: (known after apply)", field);
    }
}
