//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Agent protocol schema
//! - Mock simulator runs through the whole bridge (no CARLA needed)
//! - Real agent subprocesses fed by the bridge

#[cfg(test)]
mod contract_tests {
    use contracts::{Detection, GnssData, ObjectClass, OutboundMessage};

    #[test]
    fn test_outbound_message_fields() {
        let detection = Detection {
            bbox: [1.0, 2.0, 3.0, 4.0],
            confidence: 0.5,
            class: ObjectClass::Motorcycle,
        };
        let gnss = GnssData {
            latitude: 49.0,
            longitude: 8.0,
            altitude: 100.0,
        };
        let message = OutboundMessage::new(&detection, gnss, 12.5, 1_700_000_000.5);
        let value = serde_json::to_value(message).unwrap();

        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "bbox",
                "class_name",
                "confidence",
                "gps_alt",
                "gps_lat",
                "gps_lon",
                "heading",
                "timestamp"
            ]
        );
        assert_eq!(value["class_name"], "motorcycle");
    }

    #[test]
    fn test_allow_list() {
        for label in ["car", "truck", "bus", "person", "bicycle", "motorcycle"] {
            assert_eq!(ObjectClass::from_label(label).unwrap().as_str(), label);
        }
        for label in ["dog", "traffic light", "train", ""] {
            assert!(ObjectClass::from_label(label).is_none());
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use actor_factory::{FleetSpec, MockConfig, MockSimulatorClient, SimulatorClient};
    use agent_link::MemoryLauncher;
    use bridge::{Bridge, BridgeState};
    use detection::{DetectionPipeline, FixedDetector};
    use ingestion::FRAME_BUFFER_CAPACITY;

    type MockBridge = Bridge<MockSimulatorClient, MemoryLauncher>;

    async fn bridge_with(
        config: MockConfig,
        launcher: MemoryLauncher,
        detector: FixedDetector,
        vehicles: usize,
    ) -> MockBridge {
        let mut client = MockSimulatorClient::with_config(MockConfig {
            pace_ticks: true,
            ..config
        });
        bridge::connect(&mut client, "localhost", 2000).await.unwrap();

        let mut bridge = Bridge::new(
            client,
            launcher,
            DetectionPipeline::new(Some(Box::new(detector))),
        );
        bridge.spawn_fleet(&FleetSpec::new(vehicles)).await.unwrap();
        bridge.start_agents().await.unwrap();
        bridge
    }

    fn parse_lines(launcher: &MemoryLauncher, vehicle_id: &str) -> Vec<serde_json::Value> {
        launcher
            .transcript(vehicle_id)
            .unwrap()
            .lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// One second at 0.05s per step, one "car" per frame
    #[tokio::test(start_paused = true)]
    async fn test_e2e_one_vehicle_twenty_ticks() {
        let launcher = MemoryLauncher::new();
        let bridge = bridge_with(
            MockConfig::default(),
            launcher.clone(),
            FixedDetector::single("car", 0.9),
            1,
        )
        .await;
        assert_eq!(bridge.state(), BridgeState::AgentsRunning);
        let client = bridge.client().clone();

        let stats = bridge
            .run(Duration::from_secs(1), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 20);
        assert_eq!(stats.tick_failures, 0);
        assert_eq!(stats.frames_processed, 20);
        assert_eq!(stats.messages_forwarded, 20);
        assert_eq!(stats.step_ms.count(), 20);
        assert!(!stats.interrupted);
        assert_eq!(client.frame(), 20);

        let lines = parse_lines(&launcher, "carla_vehicle_0");
        assert_eq!(lines.len(), 20);
        for line in &lines {
            assert_eq!(line["class_name"], "car");
            assert!((line["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
            assert_eq!(line["bbox"].as_array().unwrap().len(), 4);
            assert!(line["gps_lat"].is_f64());
            assert!(line["gps_lon"].is_f64());
            assert!(line["gps_alt"].is_f64());
            assert!(line["heading"].is_f64());
            assert!(line["timestamp"].is_f64());
        }
        assert!(launcher.transcript("carla_vehicle_0").unwrap().is_shut_down());
        assert_eq!(client.actor_count(), 0);
        assert!(!client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_vehicle_feeds_its_own_agent() {
        let launcher = MemoryLauncher::new();
        let bridge = bridge_with(
            MockConfig::default(),
            launcher.clone(),
            FixedDetector::single("person", 0.7),
            3,
        )
        .await;

        let stats = bridge
            .run(Duration::from_millis(500), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.ticks, 10);
        assert_eq!(stats.frames_processed, 30);

        let first: Vec<_> = (0..3)
            .map(|i| {
                let lines = parse_lines(&launcher, &format!("carla_vehicle_{i}"));
                assert_eq!(lines.len(), 10);
                lines[0]["gps_lat"].as_f64().unwrap()
            })
            .collect();
        assert_ne!(first[0], first[1]);
        assert_ne!(first[1], first[2]);
    }

    #[tokio::test]
    async fn test_fleet_clamped_to_spawn_points() {
        let config = MockConfig {
            spawn_points: 2,
            ..Default::default()
        };
        let bridge = bridge_with(config, MemoryLauncher::new(), FixedDetector::default(), 5).await;

        assert_eq!(bridge.vehicles().len(), 2);
        for record in bridge.vehicles() {
            assert_ne!(record.camera(), record.gnss());
            assert_eq!(record.sensor_count(), 2);
            assert!(record.has_agent());
            assert!(record.last_gnss().is_none());
        }
        bridge.abort().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconsumed_frames_are_dropped() {
        let bridge = bridge_with(
            MockConfig::default(),
            MemoryLauncher::new(),
            FixedDetector::default(),
            1,
        )
        .await;

        for _ in 0..5 {
            bridge.client().tick().await.unwrap();
        }

        let record = &bridge.vehicles()[0];
        assert_eq!(record.context.frames().len(), FRAME_BUFFER_CAPACITY);
        let snapshot = bridge.ingestion_metrics().snapshot();
        assert_eq!(snapshot.frames_received, 5);
        assert_eq!(snapshot.frames_dropped, 3);
        assert_eq!(snapshot.gnss_updates, 5);
        assert!(record.last_gnss().is_some());

        bridge.abort().await;
    }

    #[tokio::test]
    async fn test_cleanup_after_nothing_succeeded() {
        let config = MockConfig {
            fail_vehicle_spawns: vec![0, 1, 2],
            ..Default::default()
        };
        let launcher = MemoryLauncher::new();
        let bridge = bridge_with(config, launcher.clone(), FixedDetector::default(), 3).await;
        assert!(bridge.vehicles().is_empty());
        let client = bridge.client().clone();

        let stats = bridge
            .run(Duration::from_millis(100), std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.frames_processed, 0);
        assert_eq!(launcher.launched(), 0);
        assert_eq!(client.actor_count(), 0);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_destroy_failures_do_not_stop_cleanup() {
        let launcher = MemoryLauncher::new();
        let mut client = MockSimulatorClient::with_config(MockConfig {
            // first vehicle actor
            fail_destroy: vec![1000],
            ..Default::default()
        });
        bridge::connect(&mut client, "localhost", 2000).await.unwrap();
        let observer = client.clone();

        let mut bridge = Bridge::new(client, launcher.clone(), DetectionPipeline::disabled());
        bridge.spawn_fleet(&FleetSpec::new(2)).await.unwrap();
        bridge.start_agents().await.unwrap();
        assert_eq!(bridge.vehicles()[0].actor(), 1000);

        bridge.abort().await;

        assert_eq!(observer.all_actor_ids(), vec![1000]);
        assert!(!observer.is_connected());
        assert!(launcher.transcript("carla_vehicle_1").unwrap().is_shut_down());
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::time::Duration;

    use actor_factory::{FleetSpec, MockConfig, MockSimulatorClient};
    use agent_link::{AgentSpec, ProcessLauncher};
    use bridge::Bridge;
    use detection::{DetectionPipeline, FixedDetector};

    /// Real subprocess agents, each writing its input to a file
    #[tokio::test]
    async fn test_bridge_feeds_process_agents() {
        let dir = tempfile::tempdir().unwrap();
        let spec = AgentSpec {
            grace_period: Duration::from_secs(5),
            ..AgentSpec::new(
                "sh",
                vec![
                    "-c".to_string(),
                    r#"cat > "$1/$AGENT_ID.jsonl""#.to_string(),
                    "sh".to_string(),
                    dir.path().to_str().unwrap().to_string(),
                ],
            )
        };

        let mut client = MockSimulatorClient::with_config(MockConfig {
            pace_ticks: true,
            ..Default::default()
        });
        bridge::connect(&mut client, "localhost", 2000).await.unwrap();

        let mut bridge = Bridge::new(
            client,
            ProcessLauncher::new(spec),
            DetectionPipeline::new(Some(Box::new(FixedDetector::single("truck", 0.6)))),
        );
        bridge.spawn_fleet(&FleetSpec::new(2)).await.unwrap();
        assert_eq!(bridge.start_agents().await.unwrap(), 2);

        let stats = bridge
            .run(Duration::from_millis(300), std::future::pending())
            .await
            .unwrap();
        assert!(stats.messages_forwarded > 0);
        assert_eq!(stats.forward_failures, 0);

        let mut total = 0;
        for i in 0..2 {
            let path = dir.path().join(format!("carla_vehicle_{i}.jsonl"));
            let written = std::fs::read_to_string(path).unwrap();
            for line in written.lines() {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(value["class_name"], "truck");
                total += 1;
            }
        }
        assert_eq!(total, stats.messages_forwarded);
    }
}
