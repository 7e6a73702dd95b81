//! Container log streaming over ssh.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::warn;

use crate::domain::Host;
use crate::error::ExecutionError;
use crate::services::ports::LogStreamer;
use crate::tools::{require_tool, tools};

use super::ssh::{shell_quote, SshOptions};

/// Streams `docker logs` from each host, prefixing lines with the host name
#[derive(Debug, Clone)]
pub struct DockerLogStreamer {
    options: SshOptions,
}

impl DockerLogStreamer {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }
}

/// Remote `docker logs` invocation with forwarded arguments
pub fn docker_logs_command(service: &str, extra_args: &[String]) -> String {
    let mut command = format!("sudo docker logs {}", shell_quote(service));
    for arg in extra_args {
        command.push(' ');
        command.push_str(&shell_quote(arg));
    }
    command
}

/// Feed each line to `emit` until EOF; invalid UTF-8 is replaced, not fatal
async fn forward_lines<R, F>(reader: R, mut emit: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(String),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                emit(line.trim_end_matches(['\n', '\r']).to_string());
            }
            Err(e) => {
                warn!("log stream read failed: {}", e);
                break;
            }
        }
    }
}

async fn stream_host(
    ssh: String,
    args: Vec<String>,
    host: Host,
    prefix_lines: bool,
) -> Result<(), ExecutionError> {
    let mut child = Command::new(&ssh)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecutionError::Spawn {
            tool: ssh.clone(),
            message: e.to_string(),
        })?;

    let prefix = if prefix_lines {
        format!("[{}] ", host.address)
    } else {
        String::new()
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_prefix = prefix.clone();
    let out_task = stdout.map(|s| {
        tokio::spawn(forward_lines(s, move |line| println!("{}{}", out_prefix, line)))
    });
    let err_task = stderr.map(|s| {
        tokio::spawn(forward_lines(s, move |line| eprintln!("{}{}", prefix, line)))
    });

    let status = child.wait().await.map_err(|e| ExecutionError::Spawn {
        tool: ssh.clone(),
        message: e.to_string(),
    })?;

    for task in [out_task, err_task].into_iter().flatten() {
        let _ = task.await;
    }

    if status.success() {
        Ok(())
    } else {
        Err(ExecutionError::OperationFailed {
            operation: "docker logs".to_string(),
            host: host.name,
            message: format!("ssh exited with {}", status),
        })
    }
}

#[async_trait]
impl LogStreamer for DockerLogStreamer {
    async fn stream_logs(
        &self,
        service: &str,
        hosts: &[Host],
        extra_args: &[String],
    ) -> Result<(), ExecutionError> {
        if hosts.is_empty() {
            return Err(ExecutionError::NoHosts {
                sequence: format!("{} logs", service),
            });
        }

        let ssh = require_tool(tools::SSH)?;
        let command = docker_logs_command(service, extra_args);
        let prefix_lines = hosts.len() > 1;

        let mut handles = Vec::new();
        for host in hosts {
            let args = self.options.ssh_args(host, &command);
            handles.push(tokio::spawn(stream_host(
                ssh.clone(),
                args,
                host.clone(),
                prefix_lines,
            )));
        }

        let mut first_error = None;
        for handle in handles {
            let result = handle.await.unwrap_or_else(|e| {
                Err(ExecutionError::Spawn {
                    tool: ssh.clone(),
                    message: format!("log task panicked: {}", e),
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

    #[test]
    fn test_docker_logs_command() {
        let args = vec!["-f".to_string(), "--tail".to_string(), "100".to_string()];
        assert_eq!(
            docker_logs_command("mongodb", &args),
            "sudo docker logs 'mongodb' '-f' '--tail' '100'"
        );
        assert_eq!(docker_logs_command("mongodb", &[]), "sudo docker logs 'mongodb'");
    }

    #[tokio::test]
    async fn test_forward_lines_survives_invalid_utf8() {
        let input: &[u8] = b"line1\n\xff\xfe bad\nline3\r\nline4";
        let mut lines = Vec::new();
        forward_lines(input, |line| lines.push(line)).await;

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "line1");
        assert!(lines[1].ends_with(" bad"));
        assert_eq!(lines[2], "line3");
        assert_eq!(lines[3], "line4");
    }

    #[tokio::test]
    async fn test_no_hosts() {
        let streamer = DockerLogStreamer::new(SshOptions::from_config(&Default::default()));
        let err = streamer.stream_logs("mongodb", &[], &[]).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NoHosts { .. }));
    }
}
