//! Download orchestration around the external download tool.
//!
//! The [`DownloadOrchestrator`] runs one tool invocation per track:
//!
//! 1. Creates an isolated scratch directory, removed on every exit path
//!    (including cancellation of the calling task).
//! 2. Spawns `<program> download <url> --output <scratch>` under a short
//!    startup bound.
//! 3. Waits for exit, draining stdout and stderr, under a separate and
//!    longer completion bound. A process that overruns is killed and reaped.
//! 4. Classifies the outcome and, on success, loads the first audio file
//!    found under the scratch directory before the directory goes away.
//!
//! # Example
//!
//! ```no_run
//! use tunefetch_core::download::{DownloadOrchestrator, DownloaderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = DownloadOrchestrator::new(DownloaderConfig::default());
//! let artifact = orchestrator
//!     .download("https://open.spotify.com/track/abc", "Imagine", "John Lennon")
//!     .await?;
//! println!("{} ({} bytes)", artifact.file_name, artifact.bytes.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::artifact::{AudioArtifact, find_audio_file};
use super::constants::{
    AUDIO_EXTENSION, COMPLETION_TIMEOUT, DEFAULT_DOWNLOADER_PROGRAM, STARTUP_TIMEOUT,
};
use super::error::DownloadFailure;

/// The download capability as seen by the conversation layer.
///
/// # Object Safety
///
/// Uses `async_trait` so the controller can hold an `Arc<dyn TrackDownloader>`
/// and tests can substitute a fake.
#[async_trait]
pub trait TrackDownloader: Send + Sync {
    /// Downloads one track. Either exactly one artifact or a failure.
    async fn download(
        &self,
        source_url: &str,
        title: &str,
        performer: &str,
    ) -> Result<AudioArtifact, DownloadFailure>;
}

/// How to invoke the download tool.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Program to run (resolved through `PATH` when not absolute).
    pub program: PathBuf,
    /// Bound on process creation.
    pub startup_timeout: Duration,
    /// Bound on process completion, measured after startup.
    pub completion_timeout: Duration,
    /// Extension of the audio file the tool writes.
    pub audio_extension: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_DOWNLOADER_PROGRAM),
            startup_timeout: STARTUP_TIMEOUT,
            completion_timeout: COMPLETION_TIMEOUT,
            audio_extension: AUDIO_EXTENSION.to_string(),
        }
    }
}

/// Runs the external download tool with layered timeouts.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    config: DownloaderConfig,
}

/// Captured result of a tool run that finished in time.
struct ToolRun {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl DownloadOrchestrator {
    #[must_use]
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Downloads `source_url` and returns the produced audio.
    ///
    /// # Errors
    ///
    /// Returns one [`DownloadFailure`] per failure class; nothing is retried.
    #[instrument(skip(self), fields(program = %self.config.program.display()))]
    pub async fn download(
        &self,
        source_url: &str,
        title: &str,
        performer: &str,
    ) -> Result<AudioArtifact, DownloadFailure> {
        let scratch = TempDir::new().map_err(|e| DownloadFailure::io(std::env::temp_dir(), e))?;
        info!(scratch = %scratch.path().display(), "downloading to scratch dir");

        let child = self.spawn_tool(source_url, scratch.path()).await?;
        let run = self.await_completion(child, source_url).await?;

        if !run.status.success() {
            let stderr = String::from_utf8_lossy(&run.stderr);
            error!(status = %run.status, stderr = %stderr, "download tool failed");
            return Err(DownloadFailure::tool_failure(run.status.to_string(), &stderr));
        }

        let artifact = self.load_artifact(scratch.path(), title, performer).await;
        if let Err(DownloadFailure::ArtifactMissing { .. }) = &artifact {
            error!(
                scratch = %scratch.path().display(),
                stdout = %String::from_utf8_lossy(&run.stdout),
                stderr = %String::from_utf8_lossy(&run.stderr),
                "download tool exited successfully without writing audio"
            );
        }
        // `scratch` is dropped only after the artifact is fully in memory.
        drop(scratch);
        artifact
    }

    /// Spawns the tool under the startup bound.
    async fn spawn_tool(&self, source_url: &str, output_dir: &Path) -> Result<Child, DownloadFailure> {
        let mut command = Command::new(&self.config.program);
        command
            .arg("download")
            .arg(source_url)
            .arg("--output")
            .arg(output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = self.config.program.display().to_string();
        // Process creation is a blocking syscall; run it off the async thread so
        // the startup bound can actually fire. A child spawned after the bound has
        // elapsed is dropped with the task result and killed by `kill_on_drop`.
        let spawn = tokio::task::spawn_blocking(move || command.spawn());
        await_spawn(spawn, self.config.startup_timeout, program).await
    }

    /// Waits for exit under the completion bound, killing the child on overrun.
    async fn await_completion(
        &self,
        mut child: Child,
        source_url: &str,
    ) -> Result<ToolRun, DownloadFailure> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = tokio::time::timeout(self.config.completion_timeout, async {
            tokio::try_join!(drain(stdout), drain(stderr), child.wait())
        })
        .await;

        match outcome {
            Ok(Ok((stdout, stderr, status))) => {
                debug!(%status, "download tool exited");
                Ok(ToolRun {
                    status,
                    stdout,
                    stderr,
                })
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed waiting on download tool");
                Err(DownloadFailure::io(self.config.program.clone(), e))
            }
            Err(_elapsed) => {
                warn!(
                    url = source_url,
                    timeout_secs = self.config.completion_timeout.as_secs(),
                    "download tool timed out, killing it"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed-out download tool");
                }
                Err(DownloadFailure::ExecutionTimeout {
                    url: source_url.to_string(),
                    timeout: self.config.completion_timeout,
                })
            }
        }
    }

    async fn load_artifact(
        &self,
        scratch: &Path,
        title: &str,
        performer: &str,
    ) -> Result<AudioArtifact, DownloadFailure> {
        let root = scratch.to_path_buf();
        let extension = self.config.audio_extension.clone();
        let found = tokio::task::spawn_blocking(move || find_audio_file(&root, &extension))
            .await
            .map_err(|e| DownloadFailure::io(scratch, std::io::Error::other(e.to_string())))?
            .map_err(|e| DownloadFailure::io(scratch, e))?;

        let Some(path) = found else {
            return Err(DownloadFailure::ArtifactMissing {
                extension: self.config.audio_extension.clone(),
            });
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DownloadFailure::io(&path, e))?;
        let file_name = path
            .file_name()
            .map_or_else(|| "audio".to_string(), |n| n.to_string_lossy().into_owned());

        info!(file = %file_name, bytes = bytes.len(), "download complete");
        Ok(AudioArtifact {
            file_name,
            title: title.to_string(),
            performer: performer.to_string(),
            bytes,
        })
    }
}

impl Default for DownloadOrchestrator {
    fn default() -> Self {
        Self::new(DownloaderConfig::default())
    }
}

#[async_trait]
impl TrackDownloader for DownloadOrchestrator {
    async fn download(
        &self,
        source_url: &str,
        title: &str,
        performer: &str,
    ) -> Result<AudioArtifact, DownloadFailure> {
        DownloadOrchestrator::download(self, source_url, title, performer).await
    }
}

/// Waits for a blocking spawn under `startup_timeout` and classifies it.
async fn await_spawn(
    spawn: JoinHandle<std::io::Result<Child>>,
    startup_timeout: Duration,
    program: String,
) -> Result<Child, DownloadFailure> {
    match tokio::time::timeout(startup_timeout, spawn).await {
        Ok(Ok(Ok(child))) => {
            debug!(pid = ?child.id(), "download tool started");
            Ok(child)
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, program = %program, "failed to launch download tool");
            Err(DownloadFailure::launch(program, e))
        }
        Ok(Err(join_error)) => {
            error!(error = %join_error, program = %program, "spawn task aborted");
            Err(DownloadFailure::launch(
                program,
                std::io::Error::other(join_error.to_string()),
            ))
        }
        Err(_elapsed) => {
            error!(
                timeout_secs = startup_timeout.as_secs(),
                program = %program,
                "download tool did not start in time"
            );
            Err(DownloadFailure::StartupTimeout {
                timeout: startup_timeout,
            })
        }
    }
}

async fn drain<R>(stream: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    if let Some(mut stream) = stream {
        stream.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}
