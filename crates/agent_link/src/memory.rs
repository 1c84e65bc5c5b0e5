//! In-memory agents

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::OutboundMessage;
use tracing::debug;

use crate::channel::{AgentChannel, AgentLauncher};
use crate::codec::JsonLineWriter;
use crate::error::{AgentError, Result};

/// Everything one in-memory agent received
#[derive(Debug, Clone, Default)]
pub struct AgentTranscript {
    lines: Arc<Mutex<Vec<String>>>,
    shut_down: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
}

impl AgentTranscript {
    /// Received lines, without the trailing newline
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Make every further send fail, like a dead process
    pub fn break_pipe(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn push(&self, bytes: Vec<u8>) {
        let text = String::from_utf8_lossy(&bytes);
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(text.lines().map(str::to_string));
    }
}

/// Launcher producing in-memory agents
#[derive(Debug, Clone, Default)]
pub struct MemoryLauncher {
    fail_for: Vec<String>,
    transcripts: Arc<Mutex<HashMap<String, AgentTranscript>>>,
}

impl MemoryLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch fails for these vehicle ids
    pub fn failing_for(vehicle_ids: &[&str]) -> Self {
        Self {
            fail_for: vehicle_ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Transcript of the agent launched for `vehicle_id`
    pub fn transcript(&self, vehicle_id: &str) -> Option<AgentTranscript> {
        self.transcripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(vehicle_id)
            .cloned()
    }

    /// Number of agents launched so far
    pub fn launched(&self) -> usize {
        self.transcripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl AgentLauncher for MemoryLauncher {
    type Agent = MemoryAgent;

    async fn launch(&self, vehicle_id: &str) -> Result<MemoryAgent> {
        if self.fail_for.iter().any(|id| id == vehicle_id) {
            return Err(AgentError::launch(vehicle_id, "injected launch failure"));
        }

        let transcript = AgentTranscript::default();
        self.transcripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(vehicle_id.to_string(), transcript.clone());

        Ok(MemoryAgent {
            writer: JsonLineWriter::new(vehicle_id, Vec::new()),
            agent_id: vehicle_id.to_string(),
            transcript,
        })
    }

    fn grace_period(&self) -> Duration {
        Duration::ZERO
    }
}

/// Agent recording its input in an [`AgentTranscript`]
pub struct MemoryAgent {
    agent_id: String,
    writer: JsonLineWriter<Vec<u8>>,
    transcript: AgentTranscript,
}

impl MemoryAgent {
    pub fn transcript(&self) -> &AgentTranscript {
        &self.transcript
    }
}

impl AgentChannel for MemoryAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        if self.transcript.is_shut_down() {
            return Err(AgentError::closed(&self.agent_id));
        }
        if self.transcript.broken.load(Ordering::SeqCst) {
            return Err(AgentError::write(&self.agent_id, "broken pipe"));
        }
        self.writer.write_message(message).await?;
        self.transcript.push(std::mem::take(self.writer.get_mut()));
        Ok(())
    }

    async fn shutdown(&mut self, _grace: Duration) {
        self.transcript.shut_down.store(true, Ordering::SeqCst);
        debug!(agent_id = %self.agent_id, "memory agent shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Detection, GnssData, ObjectClass};

    fn message() -> OutboundMessage {
        OutboundMessage::new(
            &Detection {
                bbox: [0.0, 0.0, 1.0, 1.0],
                confidence: 0.9,
                class: ObjectClass::Bus,
            },
            GnssData {
                latitude: 1.0,
                longitude: 2.0,
                altitude: 3.0,
            },
            45.0,
            10.0,
        )
    }

    #[tokio::test]
    async fn test_memory_agent_records_lines() {
        let launcher = MemoryLauncher::new();
        let mut agent = launcher.launch("v0").await.unwrap();

        agent.send(&message()).await.unwrap();
        agent.send(&message()).await.unwrap();

        let transcript = launcher.transcript("v0").unwrap();
        assert_eq!(transcript.lines().len(), 2);
        assert!(transcript.lines()[0].contains("\"class_name\":\"bus\""));
    }

    #[tokio::test]
    async fn test_launch_failure_injection() {
        let launcher = MemoryLauncher::failing_for(&["v1"]);
        assert!(launcher.launch("v0").await.is_ok());
        assert!(matches!(
            launcher.launch("v1").await,
            Err(AgentError::Launch { .. })
        ));
        assert_eq!(launcher.launched(), 1);
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails() {
        let launcher = MemoryLauncher::new();
        let mut agent = launcher.launch("v0").await.unwrap();

        agent.shutdown(Duration::ZERO).await;
        assert!(agent.transcript().is_shut_down());
        assert!(agent.send(&message()).await.is_err());
    }

    #[tokio::test]
    async fn test_broken_pipe() {
        let launcher = MemoryLauncher::new();
        let mut agent = launcher.launch("v0").await.unwrap();
        agent.transcript().break_pipe();

        let err = agent.send(&message()).await.unwrap_err();
        assert!(matches!(err, AgentError::Write { .. }));
        assert!(agent.transcript().lines().is_empty());
    }
}
