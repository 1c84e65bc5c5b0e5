//! Subprocess agents

use std::time::Duration;

use contracts::OutboundMessage;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::channel::{AgentChannel, AgentLauncher};
use crate::codec::JsonLineWriter;
use crate::error::{AgentError, Result};
use crate::spec::AgentSpec;

/// Launches agents as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    spec: AgentSpec,
}

impl ProcessLauncher {
    pub fn new(spec: AgentSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }
}

impl AgentLauncher for ProcessLauncher {
    type Agent = AgentProcess;

    #[instrument(name = "agent_launch", skip(self), fields(program = %self.spec.program))]
    async fn launch(&self, vehicle_id: &str) -> Result<AgentProcess> {
        let mut child = self
            .spec
            .command(vehicle_id)
            .spawn()
            .map_err(|e| AgentError::launch(vehicle_id, e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::launch(vehicle_id, "stdin not piped"))?;

        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(drain(vehicle_id.to_string(), "stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(drain(vehicle_id.to_string(), "stderr", stderr));
        }

        info!(agent_id = vehicle_id, pid = ?child.id(), "agent started");

        Ok(AgentProcess {
            agent_id: vehicle_id.to_string(),
            child,
            writer: Some(JsonLineWriter::new(vehicle_id, stdin)),
            drains,
        })
    }

    fn grace_period(&self) -> Duration {
        self.spec.grace_period
    }
}

/// Forward an agent output stream to the log until EOF
fn drain<R>(agent_id: String, stream: &'static str, reader: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if stream == "stderr" => warn!(agent_id = %agent_id, "{line}"),
                Ok(Some(line)) => debug!(agent_id = %agent_id, "{line}"),
                Ok(None) => break,
                Err(e) => {
                    debug!(agent_id = %agent_id, stream, error = %e, "agent output closed");
                    break;
                }
            }
        }
    })
}

/// A running agent subprocess
#[derive(Debug)]
pub struct AgentProcess {
    agent_id: String,
    child: Child,
    /// None once stdin has been closed
    writer: Option<JsonLineWriter<ChildStdin>>,
    drains: Vec<JoinHandle<()>>,
}

impl AgentProcess {
    /// OS process id, None once reaped
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Lines forwarded so far
    pub fn lines_written(&self) -> u64 {
        self.writer.as_ref().map_or(0, |w| w.lines_written())
    }
}

impl AgentChannel for AgentProcess {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_message(message).await,
            None => Err(AgentError::closed(&self.agent_id)),
        }
    }

    #[instrument(name = "agent_shutdown", skip(self), fields(agent_id = %self.agent_id))]
    async fn shutdown(&mut self, grace: Duration) {
        // end of input asks the agent to finish
        self.writer = None;

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "agent exited"),
            Ok(Err(e)) => debug!(error = %e, "agent wait failed"),
            Err(_) => {
                warn!(grace_secs = grace.as_secs_f64(), "agent did not exit in time, killing");
                if let Err(e) = self.child.kill().await {
                    debug!(error = %e, "agent kill failed");
                }
            }
        }

        for handle in self.drains.drain(..) {
            handle.abort();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use contracts::{Detection, GnssData, ObjectClass};
    use std::time::Instant;

    fn message() -> OutboundMessage {
        let detection = Detection {
            bbox: [0.0, 0.0, 10.0, 10.0],
            confidence: 0.9,
            class: ObjectClass::Car,
        };
        let gnss = GnssData {
            latitude: 49.0,
            longitude: 8.0,
            altitude: 100.0,
        };
        OutboundMessage::new(&detection, gnss, 45.0, 1_700_000_000.0)
    }

    fn shell(script: &str, extra: &[&str]) -> ProcessLauncher {
        let mut args = vec!["-c".to_string(), script.to_string(), "sh".to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        ProcessLauncher::new(AgentSpec {
            grace_period: Duration::from_secs(5),
            ..AgentSpec::new("sh", args)
        })
    }

    #[tokio::test]
    async fn test_agent_receives_env_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("agent.out");
        let launcher = shell(
            r#"printf '%s %s\n' "$AGENT_ID" "$CARLA_MODE" > "$1"; cat >> "$1""#,
            &[out.to_str().unwrap()],
        );

        let mut agent = launcher.launch("carla_vehicle_7").await.unwrap();
        assert!(agent.pid().is_some());
        agent.send(&message()).await.unwrap();
        agent.send(&message()).await.unwrap();
        assert_eq!(agent.lines_written(), 2);
        agent.shutdown(launcher.grace_period()).await;

        let written = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "carla_vehicle_7 true");
        let decoded: OutboundMessage = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(decoded, message());
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let launcher = shell("cat > /dev/null", &[]);
        let mut agent = launcher.launch("carla_vehicle_0").await.unwrap();
        agent.shutdown(launcher.grace_period()).await;

        let err = agent.send(&message()).await.unwrap_err();
        assert!(matches!(err, AgentError::Closed { .. }));
    }

    #[tokio::test]
    async fn test_stubborn_agent_killed_after_grace() {
        let launcher = shell("exec sleep 30", &[]);
        let mut agent = launcher.launch("carla_vehicle_0").await.unwrap();

        let started = Instant::now();
        agent.shutdown(Duration::from_millis(100)).await;

        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let launcher = ProcessLauncher::new(AgentSpec::new("/nonexistent/agent-binary", vec![]));
        let err = launcher.launch("carla_vehicle_0").await.unwrap_err();
        assert!(matches!(err, AgentError::Launch { .. }));
    }
}
