//! シェルコマンド実行
//!
//! `sh -c` でコマンドを実行し、終了コードで成否を判定する。

use lbcheck_common::{HarnessError, HarnessResult};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// シェルコマンドランナー
#[derive(Debug, Clone)]
pub struct CommandRunner {
    shell: String,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner {
    /// `sh` を使うランナーを作成
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    /// 使用するシェルを差し替える
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// コマンドを実行し、成功をログに残す
    ///
    /// 非ゼロ終了は `CommandFailed`、タイムアウトは `CommandTimeout` を返す。
    /// プロセスを起動できなかった場合のみ、ログ出力して `Ok(())` を返す。
    pub async fn run(&self, command: &str, description: &str, timeout: Duration) -> HarnessResult<()> {
        let child = match self.spawn(command) {
            Ok(child) => child,
            Err(err) => {
                warn!(
                    command = %command,
                    error = %err,
                    "Failed to launch command: {}",
                    description
                );
                return Ok(());
            }
        };

        wait(child, description, timeout).await?;
        info!("{}: SUCCEEDED!", description);
        Ok(())
    }

    /// コマンドを実行して標準出力を返す
    ///
    /// `run` と異なり、起動失敗も `CommandFailed` として返す。
    pub async fn capture(
        &self,
        command: &str,
        description: &str,
        timeout: Duration,
    ) -> HarnessResult<String> {
        let child = self
            .spawn(command)
            .map_err(|err| command_failed(description, err))?;
        let output = wait(child, description, timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, command: &str) -> std::io::Result<Child> {
        debug!(command = %command, "Executing command");

        Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

/// 終了を待ち、終了コードで成否を判定する
async fn wait(child: Child, description: &str, timeout: Duration) -> HarnessResult<Output> {
    // タイムアウト時は future ごと child が破棄され、kill_on_drop で停止する
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|err| command_failed(description, err))?,
        Err(_) => {
            return Err(HarnessError::CommandTimeout {
                description: description.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    };

    if !output.status.success() {
        return Err(HarnessError::CommandFailed {
            description: description.to_string(),
            output: combined_output(&output),
        });
    }

    Ok(output)
}

fn command_failed(description: &str, err: std::io::Error) -> HarnessError {
    HarnessError::CommandFailed {
        description: description.to_string(),
        output: err.to_string(),
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim_end(), stderr.trim_end()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
