//! Shallow repository checkout.
//!
//! [`RepositoryFetcher`] is the single fetch contract used by the pipeline.
//! Two implementations differ only in the checkout mechanism:
//! - [`GitFetcher`]: in-process clone through libgit2
//! - [`CommandFetcher`]: runs `git clone` as a child process
//!
//! Neither retries. Any failure becomes [`AppError::Fetch`] carrying the
//! raw diagnostic text.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use git2::{build::RepoBuilder, Cred, FetchOptions, RemoteCallbacks};

use crate::config::{FetchConfig, FetchMethod};
use crate::error::AppError;
use crate::models::RepositoryReference;

/// Checks out a remote repository into a local directory.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Clones `reference` into `destination`, creating the directory.
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        destination: &Path,
    ) -> Result<(), AppError>;
}

/// Builds the fetcher selected by `config`.
pub fn from_config(config: &FetchConfig, token: &str) -> Arc<dyn RepositoryFetcher> {
    let token = Some(token.to_string()).filter(|t| !t.is_empty());
    match config.method {
        FetchMethod::Libgit2 => Arc::new(GitFetcher {
            base_url: config.base_url.clone(),
            depth: config.depth,
            token,
        }),
        FetchMethod::Command => Arc::new(CommandFetcher {
            program: config.program.clone(),
            base_url: config.base_url.clone(),
            depth: config.depth,
            token,
        }),
    }
}

// ----------------------------------------------------------------------------
// libgit2
// ----------------------------------------------------------------------------

/// Clones through libgit2 on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    base_url: String,
    /// History depth; 0 clones full history.
    depth: u32,
    token: Option<String>,
}

impl GitFetcher {
    pub fn new(base_url: impl Into<String>, depth: u32, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            depth,
            token,
        }
    }

    fn perform_clone(
        url: &str,
        destination: &Path,
        depth: u32,
        token: Option<&str>,
        cancelled: &AtomicBool,
    ) -> Result<(), git2::Error> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(token) = token {
            callbacks.credentials(move |_url, username_from_url, allowed| {
                if allowed.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                    Cred::userpass_plaintext(username_from_url.unwrap_or("x-access-token"), token)
                } else {
                    Cred::default()
                }
            });
        }
        // Returning false aborts the transfer once the caller has gone away.
        callbacks.transfer_progress(|_| !cancelled.load(Ordering::SeqCst));

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        fetch_options.download_tags(git2::AutotagOption::None);
        if depth > 0 {
            fetch_options.depth(depth.min(i32::MAX as u32) as i32);
        }

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, destination)?;
        Ok(())
    }

    /// Runs [`Self::perform_clone`], then removes the destination if the
    /// caller cancelled meanwhile. The checkout phase ignores the cancel
    /// flag, so this is the last write to `destination`.
    fn clone_or_discard(
        url: &str,
        destination: &Path,
        depth: u32,
        token: Option<&str>,
        cancelled: &AtomicBool,
    ) -> Result<(), git2::Error> {
        let result = Self::perform_clone(url, destination, depth, token, cancelled);

        if cancelled.load(Ordering::SeqCst) {
            match std::fs::remove_dir_all(destination) {
                Ok(()) => {
                    tracing::debug!(path = %destination.display(), "Discarded cancelled clone")
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %destination.display(), error = %e, "Failed to discard cancelled clone")
                }
            }
        }
        result
    }
}

/// Sets the shared flag when the owning future is dropped.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        destination: &Path,
    ) -> Result<(), AppError> {
        let url = reference.clone_url(&self.base_url);
        let destination = destination.to_path_buf();
        let token = self.token.clone();
        let depth = self.depth;
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancelled.clone());

        tracing::info!(repository = %reference, depth, "Cloning repository");

        let result = tokio::task::spawn_blocking(move || {
            Self::clone_or_discard(&url, &destination, depth, token.as_deref(), &cancelled)
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::debug!(repository = %reference, "Clone completed");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(repository = %reference, error = %e.message(), "Clone failed");
                Err(AppError::Fetch {
                    repository: reference.to_string(),
                    cause: e.message().to_string(),
                })
            }
            Err(e) => Err(AppError::Fetch {
                repository: reference.to_string(),
                cause: format!("clone task failed: {}", e),
            }),
        }
    }
}

// ----------------------------------------------------------------------------
// git executable
// ----------------------------------------------------------------------------

/// Clones by running `<program> clone --depth <n> <url> <destination>`.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    base_url: String,
    depth: u32,
    token: Option<String>,
}

impl CommandFetcher {
    pub fn new(
        program: impl Into<String>,
        base_url: impl Into<String>,
        depth: u32,
        token: Option<String>,
    ) -> Self {
        Self {
            program: program.into(),
            base_url: base_url.into(),
            depth,
            token,
        }
    }

    /// Builds the clone invocation.
    ///
    /// The token never appears in argv: it travels in
    /// [`TOKEN_ENV`] and is handed to git by an inline credential helper
    /// injected through `GIT_CONFIG_*`.
    fn command(
        &self,
        reference: &RepositoryReference,
        destination: &Path,
    ) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("clone");
        if self.depth > 0 {
            cmd.arg("--depth").arg(self.depth.to_string());
        }
        cmd.arg(reference.clone_url(&self.base_url))
            .arg(destination)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        if let Some(token) = &self.token {
            cmd.env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "credential.helper")
                .env("GIT_CONFIG_VALUE_0", CREDENTIAL_HELPER)
                .env(TOKEN_ENV, token);
        }
        cmd
    }
}

/// Environment variable carrying the access token to the credential helper.
const TOKEN_ENV: &str = "STACKSCAN_GIT_TOKEN";

const CREDENTIAL_HELPER: &str =
    "!f() { echo username=x-access-token; echo \"password=$STACKSCAN_GIT_TOKEN\"; }; f";

#[async_trait]
impl RepositoryFetcher for CommandFetcher {
    async fn fetch(
        &self,
        reference: &RepositoryReference,
        destination: &Path,
    ) -> Result<(), AppError> {
        tracing::info!(repository = %reference, depth = self.depth, "Cloning repository");

        let output = self
            .command(reference, destination)
            .output()
            .await
            .map_err(|e| AppError::Fetch {
                repository: reference.to_string(),
                cause: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(repository = %reference, status = %output.status, stderr = %stderr.trim(), "Clone failed");
            return Err(AppError::Fetch {
                repository: reference.to_string(),
                cause: stderr,
            });
        }

        tracing::debug!(repository = %reference, "Clone completed");
        Ok(())
    }
}
