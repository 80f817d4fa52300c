//! Effect interpreter trait.
//!
//! The reconciler never talks to GitHub directly: it hands `GitHubEffect`s to
//! an injected interpreter. The trait-based design enables:
//! - The octocrab-backed client in production
//! - Scripted fakes in tests
//! - Several reconcilers sharing one client

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed for one owning organization, so all effects
/// executed through a single interpreter instance are scoped to it.
///
/// An interpreter executes each effect exactly once. Retrying is the caller's
/// decision, because some calls (team creation) must never be repeated.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = GitHubApiError;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| GitHubApiError::not_found(format!("unexpected effect: {:?}", effect)))
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}
