use futures::StreamExt;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::sleep;
use tokio_util::codec::{FramedRead, LinesCodec};

use chrono::{TimeZone, Utc};
use nmea_sim::ais::{self, AisEncoder, Channel};
use nmea_sim::clock::SimulationClock;
use nmea_sim::codec::{self, gps};
use nmea_sim::engine::{EngineConfig, SimulationEngine};
use nmea_sim::movement::geodesy::destination;
use nmea_sim::movement::{LinearModel, MovementModel};
use nmea_sim::output::{FileSink, FileSinkConfig, MemorySink, TcpSink, TcpSinkConfig};
use nmea_sim::types::constants::KNOTS_TO_MPS;
use nmea_sim::types::{
    AisMessage, Kinematics, Mmsi, NavigationStatus, Position, PositionReport, Scenario, VesselClass, VesselState,
};
use nmea_sim::utils::logging;

fn eastbound_scenario(duration: Duration) -> Scenario {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let kinematics = Kinematics::new(Position::new(37.7749, -122.4194), 15.0, 90.0);
    let mut vessel = VesselState::new(Mmsi(367001234), "EASTBOUND", VesselClass::A, kinematics)
        .with_movement(MovementModel::Linear(LinearModel::new(0.0, 0.0, 0.0)));
    vessel.call_sign = "WDC1234".to_string();
    vessel.gps_output = true;

    let mut scenario = Scenario::new("eastbound", start).with_duration(duration);
    scenario.vessels.push(vessel);
    scenario
}

/// Tests the eastbound vessel after 10 simulated seconds:
/// - The final GGA and RMC sentences carry a longitude east of the start
/// - Both match the great-circle projection within 1e-4 degrees
#[tokio::test(start_paused = true)]
async fn test_eastbound_vessel_gps_projection() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_eastbound_vessel_gps_projection ===");

    let sink = MemorySink::new("memory");
    let mut engine = SimulationEngine::new(
        eastbound_scenario(Duration::from_secs(10)),
        SimulationClock::new(1.0, Duration::from_secs(1)),
        EngineConfig::default().with_seed(1),
    );
    engine.add_sink(Box::new(sink.clone())).unwrap();
    engine.start().await.unwrap();
    engine.wait().await.unwrap();

    let start = Position::new(37.7749, -122.4194);
    let expected = destination(start, 90.0, 15.0 * KNOTS_TO_MPS * 10.0);
    let lines = sink.lines();
    let gga = lines.iter().rev().find(|l| l.starts_with("$GPGGA")).unwrap();
    let rmc = lines.iter().rev().find(|l| l.starts_with("$GPRMC")).unwrap();
    assert!(gga.starts_with("$GPGGA,120010.00,"));
    assert!(codec::validate(gga) && codec::validate(rmc));

    for position in [
        gps::gga_position(&codec::parse(gga).unwrap()).unwrap(),
        gps::rmc_position(&codec::parse(rmc).unwrap()).unwrap(),
    ] {
        assert!(position.longitude() > start.longitude());
        assert!((position.latitude() - expected.latitude()).abs() < 1e-4);
        assert!((position.longitude() - expected.longitude()).abs() < 1e-4);
    }
    logging::log("TEST", &format!("✓ Final GGA: {}", gga.trim_end()));

    logging::log("TEST", "=== Test completed successfully ===");
}

/// Tests the Type 1 golden sentence through the public API
#[test]
fn test_ais_type1_golden() {
    let report = AisMessage::PositionReport(PositionReport {
        message_type: 1,
        repeat: 0,
        mmsi: Mmsi(367001234),
        nav_status: NavigationStatus::UnderWayUsingEngine,
        rate_of_turn: Some(0.0),
        speed_knots: Some(15.0),
        position_accuracy: false,
        position: Some(Position::new(37.7749, -122.4194)),
        course_deg: Some(90.0),
        heading_deg: Some(90),
        timestamp_second: 19,
        maneuver: 0,
        raim: false,
        radio_status: 0,
    });
    let sentences = AisEncoder::new().encode(&report, Channel::A).unwrap();
    assert_eq!(sentences, vec!["!AIVDM,1,1,,A,15MwvTP02FG?Vt@EWFs3Q2lV0000,0*79\r\n".to_string()]);
    assert!(codec::validate(&sentences[0]));
    assert_eq!(ais::decode(&sentences).unwrap().mmsi(), Mmsi(367001234));
}

fn fleet_scenario(vessels: u32, duration: Duration) -> Scenario {
    let mut scenario = eastbound_scenario(duration);
    for i in 1..vessels {
        let mut vessel = scenario.vessels[0].clone();
        vessel.mmsi = Mmsi(367001234 + i);
        vessel.kinematics.position = Position::new(37.7 + i as f64 * 0.001, -122.4);
        scenario.vessels.push(vessel);
    }
    scenario
}

fn free_loopback_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Tests TCP fan-out from a running engine with one stalled client:
/// - Both reading clients receive every sentence generated after they connected, in order
/// - The stalled client is disconnected
/// - The run finishes on schedule
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tcp_fanout_with_stalled_client() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_tcp_fanout_with_stalled_client ===");

    let port = free_loopback_port();
    let tcp = TcpSink::new(TcpSinkConfig {
        bind_address: format!("127.0.0.1:{}", port),
        max_clients: 5,
        queue_capacity: 256,
        send_timeout_ms: 500,
        send_buffer_size: Some(4096),
    });
    let reference = MemorySink::new("reference");

    // 20 vessels for 200 virtual seconds at 50x: about 9000 sentences in 4 seconds
    let mut engine = SimulationEngine::new(
        fleet_scenario(20, Duration::from_secs(200)),
        SimulationClock::new(50.0, Duration::from_secs(1)),
        EngineConfig::default().with_seed(3),
    );
    engine.add_sink(Box::new(tcp)).unwrap();
    engine.add_sink(Box::new(reference.clone())).unwrap();
    engine.start().await.unwrap();
    engine.pause().unwrap();

    let mut readers = Vec::new();
    for _ in 0..2 {
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        readers.push(tokio::spawn(async move {
            FramedRead::new(stream, LinesCodec::new())
                .filter_map(|line| async move { line.ok() })
                .collect::<Vec<String>>()
                .await
        }));
    }
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let _stalled = socket.connect(([127, 0, 0, 1], port).into()).await.unwrap();
    sleep(Duration::from_millis(300)).await;
    logging::log("TEST", "✓ Clients connected");

    let started = Instant::now();
    engine.resume().unwrap();
    let summary = engine.wait().await.unwrap();
    let elapsed = started.elapsed();
    assert_eq!(summary.virtual_time, Duration::from_secs(200));
    assert!(elapsed < Duration::from_secs(10), "run took {:?}", elapsed);

    let generated: Vec<String> = reference.lines().iter().map(|l| l.trim_end().to_string()).collect();
    assert_eq!(generated.len() as u64, summary.sentences);
    for reader in readers {
        let received = reader.await.unwrap();
        assert!(received.len() * 10 >= generated.len() * 9, "{} of {}", received.len(), generated.len());
        assert_eq!(received[..], generated[generated.len() - received.len()..]);
    }
    logging::log("TEST", "✓ Responsive clients received the full stream");

    let tcp_stats = summary.sinks.iter().find(|s| s.name.starts_with("tcp:")).unwrap().stats;
    assert!(tcp_stats.disconnects >= 1, "{:?}", tcp_stats);
    logging::log("TEST", &format!("✓ TCP sink stats: {:?}", tcp_stats));

    logging::log("TEST", "=== Test completed successfully ===");
}

/// Tests an engine writing to a file sink:
/// - Every line in the file is a valid sentence
/// - The file holds exactly the sentences the run reports
/// - AIS position reports in the file decode back to the vessel
#[tokio::test]
async fn test_engine_to_file() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_engine_to_file ===");

    let dir = tempdir().unwrap();
    let path = dir.path().join("run.nmea");
    let mut engine = SimulationEngine::new(
        eastbound_scenario(Duration::from_secs(30)),
        SimulationClock::new(100.0, Duration::from_secs(1)),
        EngineConfig::default().with_seed(11),
    );
    engine.add_sink(Box::new(FileSink::new(FileSinkConfig::new(&path)))).unwrap();
    engine.start().await.unwrap();
    let summary = engine.wait().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<String> = content.split_inclusive("\r\n").map(str::to_string).collect();
    assert_eq!(lines.len() as u64, summary.sentences);
    assert!(lines.iter().all(|l| codec::validate(l)));

    let reports: Vec<&String> = lines.iter().filter(|l| l.starts_with("!AIVDM,1,1,")).collect();
    assert!(!reports.is_empty());
    for report in reports {
        match ais::decode(&[report]).unwrap() {
            AisMessage::PositionReport(r) => {
                assert_eq!(r.mmsi, Mmsi(367001234));
                assert!(r.position.unwrap().longitude() > -122.4195);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    logging::log("TEST", &format!("✓ {} sentences written", lines.len()));

    logging::log("TEST", "=== Test completed successfully ===");
}
