//! Manual integration test for the team reconciler.
//!
//! This example drives a throwaway team through its whole lifecycle against a
//! real organization: create, conditional re-read, rename, delete, and a final
//! read that should observe the team as gone.
//!
//! # Usage
//!
//! 1. Set `GITHUB_TOKEN` to a token with `admin:org` scope.
//!
//! 2. Set `GITHUB_OWNER` to an organization you administer.
//!
//! 3. Optionally set `GITHUB_BASE_URL` for GitHub Enterprise Server.
//!
//! 4. Run: `cargo run --example team_lifecycle`
//!
//! # Note
//!
//! This test performs real API calls and creates (then deletes) a team named
//! `team-provider-smoke-<pid>`. If it fails midway the team may be left behind.

use std::time::Duration;

use github_team_provider::config::ProviderConfig;
use github_team_provider::github::{OctocrabClient, RetryConfig};
use github_team_provider::reconciler::{ReadOutcome, TeamReconciler};
use github_team_provider::types::{Privacy, TeamConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,github_team_provider=debug".into()),
        )
        .init();

    // Short waits: nothing here races another applier.
    let config = ProviderConfig::from_env()?.with_wait(Duration::from_secs(1));
    let retry: RetryConfig = config.retry_config();

    println!("Connecting to {} as owner {}", config.base_url, config.owner);
    let client = OctocrabClient::connect(config.token.clone(), &config.base_url, &config.owner).await?;
    let owner = client.owner().clone();
    if !owner.is_organization {
        anyhow::bail!("{} is not an organization", owner.name);
    }
    let reconciler = TeamReconciler::with_retry(client, owner, retry);

    let name = format!("team-provider-smoke-{}", std::process::id());
    let desired = TeamConfig::new(&name).with_description("created by the team_lifecycle example");

    println!("\n=== Create ===");
    let id = reconciler.create(&desired).await?;
    println!("  ✓ created team {}", id);

    println!("\n=== Read ===");
    let state = match reconciler.read(id, None).await? {
        ReadOutcome::Found(state) => state,
        other => anyhow::bail!("expected team to exist, got {:?}", other),
    };
    println!("  ✓ slug={} members={} etag={}", state.slug, state.members_count, state.etag);

    println!("\n=== Conditional read ===");
    match reconciler.read(id, Some(&state.etag)).await? {
        ReadOutcome::NotModified => println!("  ✓ not modified"),
        ReadOutcome::Found(_) => println!("  ⚠ GitHub returned a full body despite a matching tag"),
        ReadOutcome::Gone => anyhow::bail!("team vanished"),
    }

    println!("\n=== Update ===");
    let renamed = desired
        .clone()
        .with_privacy(Privacy::Closed)
        .with_description("renamed by the team_lifecycle example");
    let renamed = TeamConfig {
        name: format!("{}-renamed", name),
        ..renamed
    };
    let updated = reconciler.update(id, &renamed, &state).await?;
    println!("  ✓ slug={} privacy={}", updated.slug, updated.privacy);

    println!("\n=== Delete ===");
    reconciler.delete(id).await?;
    println!("  ✓ deleted");

    println!("\n=== Read after delete ===");
    match reconciler.read(id, None).await? {
        ReadOutcome::Gone => println!("  ✓ team is gone"),
        other => anyhow::bail!("expected team to be gone, got {:?}", other),
    }

    Ok(())
}
