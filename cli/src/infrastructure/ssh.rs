//! SSH execution engine
//!
//! Runs operation sequences by shelling out to `ssh`/`scp`. Scripts are read
//! from the assets directory and piped to `bash -s` on the host with their
//! variables exported in front. Hosts run in parallel; within a host the
//! operations run in order and stop at the first failure.

use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::SshConfig;
use crate::domain::{Host, OperationAction, OperationSequence, OperationVars, VarValue};
use crate::error::ExecutionError;
use crate::services::ports::{ExecutionEngine, RunOptions};
use crate::tools::{require_tool, tools};

/// Lines of remote stderr kept in failure messages
const STDERR_TAIL_LINES: usize = 5;

/// Connection flags shared by ssh and scp
#[derive(Debug, Clone)]
pub struct SshOptions {
    connect_timeout: u64,
    strict_host_key_checking: String,
}

impl SshOptions {
    pub fn from_config(config: &SshConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            strict_host_key_checking: config.strict_host_key_checking.clone(),
        }
    }

    fn common_args(&self, host: &Host, port_flag: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.strict_host_key_checking),
            port_flag.to_string(),
            host.port.to_string(),
        ];
        if let Some(pem) = &host.pem {
            args.push("-i".to_string());
            args.push(pem.display().to_string());
        }
        args
    }

    /// Arguments for `ssh` running `remote_command` on `host`
    pub fn ssh_args(&self, host: &Host, remote_command: &str) -> Vec<String> {
        let mut args = self.common_args(host, "-p");
        args.push(host.destination());
        args.push(remote_command.to_string());
        args
    }

    /// Arguments for `scp` uploading `local` to `remote` on `host`
    pub fn scp_upload_args(&self, host: &Host, local: &Path, remote: &str) -> Vec<String> {
        let mut args = self.common_args(host, "-P");
        args.push(local.display().to_string());
        args.push(format!("{}:{}", host.destination(), remote));
        args
    }

    /// Arguments for a recursive `scp` download from `host`
    pub fn scp_download_args(&self, host: &Host, remote: &str, local: &Path) -> Vec<String> {
        let mut args = self.common_args(host, "-P");
        args.push("-r".to_string());
        args.push(format!("{}:{}", host.destination(), remote));
        args.push(local.display().to_string());
        args
    }
}

/// Single-quote a value for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Remote command that exports the variables and reads the script on stdin
///
/// List values are exported space separated.
pub fn script_command(vars: &OperationVars) -> String {
    let mut command = String::new();
    for (key, value) in vars.to_map() {
        let rendered = match value {
            VarValue::Str(s) => s,
            VarValue::List(items) => items.join(" "),
        };
        command.push_str(&format!("export {}={}; ", key, shell_quote(&rendered)));
    }
    command.push_str("bash -s");
    command
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Execution engine backed by the system `ssh`/`scp` binaries
#[derive(Debug, Clone)]
pub struct SshExecutor {
    options: SshOptions,
    assets_dir: PathBuf,
}

impl SshExecutor {
    /// Create a new executor reading scripts from `assets_dir`
    pub fn new(options: SshOptions, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            assets_dir: assets_dir.into(),
        }
    }

    fn asset_path(&self, file_name: &str) -> PathBuf {
        self.assets_dir.join(file_name)
    }

    /// Fail before touching any host if a referenced asset is missing
    fn check_assets(&self, sequence: &OperationSequence) -> Result<(), ExecutionError> {
        for operation in &sequence.operations {
            let asset = match &operation.action {
                OperationAction::ExecuteScript { script, .. } => script,
                OperationAction::Copy { src, .. } => src,
            };
            let path = self.asset_path(asset.file_name());
            if !path.is_file() {
                return Err(ExecutionError::AssetNotFound {
                    path: path.display().to_string(),
                });
            }
        }
        Ok(())
    }

    async fn run_on_host(
        &self,
        sequence: &OperationSequence,
        host: &Host,
        tools: &ResolvedTools,
        progress: Option<ProgressBar>,
    ) -> Result<(), ExecutionError> {
        for operation in &sequence.operations {
            if let Some(pb) = &progress {
                pb.set_message(format!("{}: {}", host.name, operation.name));
            }
            debug!(host = %host.name, operation = %operation.name, "Running remote operation");

            let result = match &operation.action {
                OperationAction::ExecuteScript { script, vars } => {
                    let path = self.asset_path(script.file_name());
                    let args = self.options.ssh_args(host, &script_command(vars));
                    run_with_stdin(&tools.ssh, &args, &path, progress.is_none()).await
                }
                OperationAction::Copy { src, dest } => {
                    let path = self.asset_path(src.file_name());
                    let args = self.options.scp_upload_args(host, &path, dest);
                    run_command(&tools.scp, &args, progress.is_none()).await
                }
            };

            if let Err(message) = result {
                if let Some(pb) = &progress {
                    pb.abandon_with_message(format!("{}: {} failed", host.name, operation.name));
                }
                return Err(ExecutionError::OperationFailed {
                    operation: operation.name.clone(),
                    host: host.name.clone(),
                    message,
                });
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message(format!("{}: {} done", host.name, sequence.title));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct ResolvedTools {
    ssh: String,
    scp: String,
}

fn spinner(multi: &MultiProgress) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run a command; on failure return a message with the stderr tail
async fn run_command(program: &str, args: &[String], inherit: bool) -> Result<(), String> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());

    if inherit {
        let status = cmd
            .status()
            .await
            .map_err(|e| format!("failed to spawn {}: {}", program, e))?;
        return if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        };
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to spawn {}: {}", program, e))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr_tail(&output.stderr)
        ))
    }
}

/// Run a command with a local file piped to its stdin
async fn run_with_stdin(
    program: &str,
    args: &[String],
    stdin_file: &Path,
    inherit: bool,
) -> Result<(), String> {
    let script = tokio::fs::read(stdin_file)
        .await
        .map_err(|e| format!("failed to read {}: {}", stdin_file.display(), e))?;

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::piped());
    if inherit {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {}", program, e))?;

    // Output is drained while the script is still being written
    let writer = child.stdin.take().map(|mut stdin| {
        tokio::spawn(async move { stdin.write_all(&script).await })
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("failed to wait for {}: {}", program, e))?;

    if !output.status.success() {
        return Err(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr_tail(&output.stderr)
        ));
    }

    match writer {
        Some(writer) => match writer.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("failed to send script: {}", e)),
            Err(e) => Err(format!("script writer panicked: {}", e)),
        },
        None => Ok(()),
    }
}

#[async_trait]
impl ExecutionEngine for SshExecutor {
    async fn run(
        &self,
        sequence: &OperationSequence,
        hosts: &[Host],
        options: RunOptions,
    ) -> Result<(), ExecutionError> {
        if hosts.is_empty() {
            return Err(ExecutionError::NoHosts {
                sequence: sequence.title.clone(),
            });
        }

        self.check_assets(sequence)?;

        let needs_scp = sequence
            .operations
            .iter()
            .any(|op| matches!(op.action, OperationAction::Copy { .. }));
        let resolved = ResolvedTools {
            ssh: require_tool(tools::SSH)?,
            scp: if needs_scp {
                require_tool(tools::SCP)?
            } else {
                tools::SCP.to_string()
            },
        };

        info!("▶ {} on {} host(s)", sequence.title, hosts.len());
        let multi = MultiProgress::new();

        let mut handles = Vec::new();
        for host in hosts {
            let executor = self.clone();
            let sequence = sequence.clone();
            let host = host.clone();
            let resolved = resolved.clone();
            let progress = (!options.verbose).then(|| spinner(&multi));

            let handle = tokio::spawn(async move {
                executor
                    .run_on_host(&sequence, &host, &resolved, progress)
                    .await
            });
            handles.push(handle);
        }

        // Every host runs to completion; the first failure is reported
        let mut first_error = None;
        for handle in handles {
            let result = handle.await.unwrap_or_else(|e| {
                Err(ExecutionError::Spawn {
                    tool: tools::SSH.to_string(),
                    message: format!("host task panicked: {}", e),
                })
            });
            if let Err(e) = result {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::{RemoteOperation, ScriptRef};
    use crate::domain::sequence;

    fn options() -> SshOptions {
        SshOptions::from_config(&SshConfig::default())
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_script_command_exports_vars() {
        let vars = OperationVars::start("3.4.1", "10.0.0.1,10.0.0.2").unwrap();
        assert_eq!(
            script_command(&vars),
            "export ipwhitelist='10.0.0.1,10.0.0.2'; export mongoVersion='3.4.1'; bash -s"
        );
        assert_eq!(script_command(&OperationVars::None), "bash -s");
    }

    #[test]
    fn test_script_command_joins_lists() {
        let vars = OperationVars::restrict_access(
            &["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            "shop",
            vec!["shop-nginx-letsencrypt".to_string(), "shop-nginx-proxy".to_string()],
        )
        .unwrap();
        let command = script_command(&vars);
        assert!(command.contains("export ips='10.0.0.1 10.0.0.2';"));
        assert!(command.contains("export localServers='shop-nginx-letsencrypt shop-nginx-proxy';"));
        assert!(command.contains("export name='shop';"));
    }

    #[test]
    fn test_ssh_args() {
        let mut host = Host::new("one", "10.0.0.5");
        host.pem = Some(PathBuf::from("/keys/id_rsa"));
        host.port = 2222;

        let args = options().ssh_args(&host, "bash -s");
        assert!(args.windows(2).any(|w| w == ["-p", "2222"]));
        assert!(args.windows(2).any(|w| w == ["-i", "/keys/id_rsa"]));
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        assert_eq!(&args[args.len() - 2..], ["root@10.0.0.5", "bash -s"]);
    }

    #[test]
    fn test_scp_args() {
        let host = Host::new("one", "10.0.0.5");
        let upload = options().scp_upload_args(&host, Path::new("assets/mongodb.conf"), "/opt/mongodb/mongodb.conf");
        assert!(upload.windows(2).any(|w| w == ["-P", "22"]));
        assert_eq!(upload.last().unwrap(), "root@10.0.0.5:/opt/mongodb/mongodb.conf");

        let download = options().scp_download_args(&host, "dump", Path::new("backups/dump"));
        assert_eq!(&download[download.len() - 3..], ["-r", "root@10.0.0.5:dump", "backups/dump"]);
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = b"1\n2\n3\n4\n5\n6\n7\n";
        assert_eq!(stderr_tail(stderr), "3\n4\n5\n6\n7");
    }

    #[tokio::test]
    async fn test_large_script_with_chatty_remote() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("big.sh");
        std::fs::write(&script, vec![b'x'; 1 << 20]).unwrap();

        // `cat` echoes the whole script back on the piped stdout
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            run_with_stdin("cat", &[], &script, false),
        )
        .await
        .expect("stdin and stdout must not deadlock");
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_missing_asset_fails_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let executor = SshExecutor::new(options(), dir.path());

        let err = executor
            .run(&sequence::stop(), &[Host::new("one", "10.0.0.5")], RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::AssetNotFound { ref path } if path.ends_with("mongo-stop.sh")));
    }

    #[tokio::test]
    async fn test_no_hosts() {
        let executor = SshExecutor::new(options(), "assets");
        let err = executor
            .run(&sequence::stop(), &[], RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::NoHosts { .. }));
    }

    #[tokio::test]
    async fn test_stops_at_first_failing_operation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.sh"), "exit 1").unwrap();
        std::fs::write(dir.path().join("second.sh"), "exit 0").unwrap();

        // `false` stands in for ssh: every remote command fails
        let executor = SshExecutor::new(options(), dir.path());
        let tools = ResolvedTools {
            ssh: "false".to_string(),
            scp: "false".to_string(),
        };
        let sequence = OperationSequence::new("Two Steps")
            .then(RemoteOperation::execute_script(
                "First",
                ScriptRef::new("first.sh"),
                OperationVars::None,
            ))
            .then(RemoteOperation::execute_script(
                "Second",
                ScriptRef::new("second.sh"),
                OperationVars::None,
            ));

        let err = executor
            .run_on_host(&sequence, &Host::new("one", "10.0.0.5"), &tools, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::OperationFailed { ref operation, .. } if operation == "First"
        ));
    }
}
