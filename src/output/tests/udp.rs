use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::output::{OutputSink, SinkError, UdpSink, UdpSinkConfig};
use crate::utils::logging;

/// Tests unicast delivery over loopback:
/// - Each sentence arrives as one datagram, in order
/// - Sent and byte counters match what was delivered
#[tokio::test]
async fn test_udp_sink_delivers_datagrams() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_udp_sink_delivers_datagrams ===");

    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = UdpSinkConfig::new(receiver.local_addr().unwrap().to_string());
    config.bind_address = "127.0.0.1:0".to_string();

    let mut sink = UdpSink::new(config);
    sink.start().await.unwrap();
    let sentences: Vec<String> = (0..5).map(|i| format!("$GPTST,{}*00\r\n", i)).collect();
    for s in &sentences {
        sink.write(s).unwrap();
    }

    let mut buf = [0u8; 128];
    for expected in &sentences {
        let len = timeout(Duration::from_secs(2), receiver.recv(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..len], expected.as_bytes());
    }
    sink.close(Duration::from_secs(1)).await.unwrap();

    let stats = sink.stats();
    assert_eq!(stats.sent, 5);
    assert_eq!(stats.bytes, sentences.iter().map(|s| s.len() as u64).sum::<u64>());
    logging::log("TEST", "✓ All datagrams received");

    logging::log("TEST", "=== Test completed successfully ===");
}

/// Tests the hand-off buffer:
/// - Sentences beyond the buffer are dropped without an error
#[tokio::test]
async fn test_udp_sink_drops_on_full_buffer() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = UdpSinkConfig::new(receiver.local_addr().unwrap().to_string());
    config.bind_address = "127.0.0.1:0".to_string();
    config.buffer = 1;

    let mut sink = UdpSink::new(config);
    sink.start().await.unwrap();
    // The sender task cannot run between these synchronous writes
    for _ in 0..100 {
        sink.write("$GPTST*00\r\n").unwrap();
    }
    assert_eq!(sink.stats().dropped, 99);

    sink.close(Duration::from_secs(1)).await.unwrap();
    assert_eq!(sink.stats().sent, 1);
}

/// Tests configuration errors:
/// - An unparsable destination fails start
/// - Writing before start is rejected
#[tokio::test]
async fn test_udp_sink_invalid_destination() {
    let mut sink = UdpSink::new(UdpSinkConfig::new("not-an-address"));
    assert!(matches!(sink.write("$X*00\r\n"), Err(SinkError::NotRunning(_))));
    assert!(matches!(sink.start().await, Err(SinkError::InvalidAddress(_))));
}

/// Tests the broadcast and multicast socket options:
/// - Enabling broadcast and a multicast TTL does not fail start
/// - Unicast delivery and counters are unaffected by either option
#[tokio::test]
async fn test_udp_sink_broadcast_and_ttl_options() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_udp_sink_broadcast_and_ttl_options ===");

    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = UdpSinkConfig::new(receiver.local_addr().unwrap().to_string());
    config.bind_address = "127.0.0.1:0".to_string();
    config.broadcast = true;
    config.multicast_ttl = Some(4);

    let mut sink = UdpSink::new(config);
    sink.start().await.unwrap();
    logging::log("TEST", "✓ Socket options applied");

    for i in 0..3 {
        sink.write(&format!("!AIVDM,1,1,,A,{},0*00\r\n", i)).unwrap();
    }
    let mut buf = [0u8; 128];
    for i in 0..3 {
        let len = timeout(Duration::from_secs(2), receiver.recv(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..len], format!("!AIVDM,1,1,,A,{},0*00\r\n", i).as_bytes());
    }
    sink.close(Duration::from_secs(1)).await.unwrap();

    let stats = sink.stats();
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.errors, 0);
    logging::log("TEST", "✓ Datagrams delivered with both options set");

    logging::log("TEST", "=== Test completed successfully ===");
}
