//! JSON-lines framing

use contracts::OutboundMessage;
use metrics::counter;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{AgentError, Result};

/// Writes one JSON object per line and flushes after every message
///
/// Newline is the only delimiter: no length prefix, no batching.
#[derive(Debug)]
pub struct JsonLineWriter<W> {
    agent_id: String,
    inner: W,
    lines_written: u64,
    write_failures: u64,
}

impl<W: AsyncWrite + Unpin> JsonLineWriter<W> {
    pub fn new(agent_id: impl Into<String>, inner: W) -> Self {
        Self {
            agent_id: agent_id.into(),
            inner,
            lines_written: 0,
            write_failures: 0,
        }
    }

    /// Serialize, append `\n`, write and flush
    pub async fn write_message(&mut self, message: &OutboundMessage) -> Result<()> {
        let result = self.write_line(message).await;
        let status = if result.is_ok() {
            self.lines_written += 1;
            "ok"
        } else {
            self.write_failures += 1;
            "error"
        };
        counter!(
            "carla_bridge_agent_lines_total",
            "agent_id" => self.agent_id.clone(),
            "status" => status
        )
        .increment(1);
        result
    }

    async fn write_line(&mut self, message: &OutboundMessage) -> Result<()> {
        let mut line = serde_json::to_vec(message)
            .map_err(|e| AgentError::write(&self.agent_id, format!("serialize: {e}")))?;
        line.push(b'\n');

        self.inner
            .write_all(&line)
            .await
            .map_err(|e| AgentError::write(&self.agent_id, e.to_string()))?;
        self.inner
            .flush()
            .await
            .map_err(|e| AgentError::write(&self.agent_id, e.to_string()))
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Messages that could not be written
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Detection, GnssData, ObjectClass};

    fn message(confidence: f32) -> OutboundMessage {
        let detection = Detection {
            bbox: [1.0, 2.0, 3.0, 4.0],
            confidence,
            class: ObjectClass::Car,
        };
        let reading = GnssData {
            latitude: 48.1,
            longitude: 11.5,
            altitude: 520.0,
        };
        OutboundMessage::new(&detection, reading, 90.0, 1_700_000_000.0)
    }

    #[tokio::test]
    async fn test_one_line_per_message() {
        let mut writer = JsonLineWriter::new("carla_vehicle_0", Vec::new());
        writer.write_message(&message(0.5)).await.unwrap();
        writer.write_message(&message(0.75)).await.unwrap();

        assert_eq!(writer.lines_written(), 2);
        assert_eq!(writer.write_failures(), 0);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let decoded: OutboundMessage = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(decoded, message(0.75));
    }

    #[tokio::test]
    async fn test_closed_pipe_is_write_error() {
        let (client, server) = tokio::io::duplex(64);
        drop(server);
        let mut writer = JsonLineWriter::new("carla_vehicle_1", client);

        let err = writer.write_message(&message(0.5)).await.unwrap_err();
        assert!(matches!(err, AgentError::Write { ref agent_id, .. } if agent_id == "carla_vehicle_1"));
        assert_eq!(writer.lines_written(), 0);
        assert_eq!(writer.write_failures(), 1);

        assert!(writer.write_message(&message(0.6)).await.is_err());
        assert_eq!(writer.write_failures(), 2);
    }
}
