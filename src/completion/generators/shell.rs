//! 生成器使用的 shell 执行器

use crate::completion::error::{CompletionError, CompletionResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

/// 默认输出上限（1 MiB）
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// 一次 shell 调用的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ShellOutput {
    /// 执行失败时的占位结果
    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: 1,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// 一次 shell 调用的参数
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub command: String,
    pub cwd: String,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

/// 执行 shell 命令的抽象，测试中可替换
#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, request: &ShellCommand) -> CompletionResult<ShellOutput>;
}

/// 基于 `tokio::process` 的系统 shell
#[derive(Debug, Clone)]
pub struct SystemShellRunner {
    shell: String,
}

impl SystemShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for SystemShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl ShellRunner for SystemShellRunner {
    async fn run(&self, request: &ShellCommand) -> CompletionResult<ShellOutput> {
        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(&request.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !request.cwd.is_empty() {
            command.current_dir(&request.cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| CompletionError::io(format!("spawning `{}`", request.command), e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = request.max_output_bytes as u64;

        let collect = async move {
            let (stdout, stderr) =
                tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
            let status = child.wait().await;
            (stdout, stderr, status)
        };

        // 超时后 child 随 future 一起被丢弃，kill_on_drop 负责终止进程
        let (stdout, stderr, status) = tokio::time::timeout(request.timeout, collect)
            .await
            .map_err(|_| CompletionError::GeneratorTimeout {
                command: request.command.clone(),
                timeout_ms: request.timeout.as_millis() as u64,
            })?;

        let context = || format!("running `{}`", request.command);
        let status = status.map_err(|e| CompletionError::io(context(), e))?;

        Ok(ShellOutput {
            stdout: stdout.map_err(|e| CompletionError::io(context(), e))?,
            stderr: stderr.map_err(|e| CompletionError::io(context(), e))?,
            exit_code: status.code().unwrap_or(1),
        })
    }
}

/// 读取至多 `limit` 字节，其余部分丢弃，避免子进程写满管道后阻塞
async fn read_capped<R>(pipe: Option<R>, limit: u64) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    (&mut pipe).take(limit).read_to_end(&mut buffer).await?;
    tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// 交给 `Exec` 生成器的执行句柄，从不失败
#[derive(Clone)]
pub struct ShellExec {
    runner: Arc<dyn ShellRunner>,
    cwd: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ShellExec {
    pub fn new(
        runner: Arc<dyn ShellRunner>,
        cwd: impl Into<String>,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            runner,
            cwd: cwd.into(),
            timeout,
            max_output_bytes,
        }
    }

    /// 执行命令，`cwd` 缺省为补全上下文的工作目录
    pub async fn run(&self, command: &str, cwd: Option<&str>) -> ShellOutput {
        let request = ShellCommand {
            command: command.to_string(),
            cwd: cwd.unwrap_or(&self.cwd).to_string(),
            timeout: self.timeout,
            max_output_bytes: self.max_output_bytes,
        };

        match self.runner.run(&request).await {
            Ok(output) => output,
            Err(err) => {
                debug!("生成器命令执行失败: {}", err);
                ShellOutput::failure(err.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ShellExec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellExec")
            .field("cwd", &self.cwd)
            .field("timeout", &self.timeout)
            .field("max_output_bytes", &self.max_output_bytes)
            .finish()
    }
}
