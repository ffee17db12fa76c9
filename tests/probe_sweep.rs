use std::{
    collections::HashSet,
    net::{SocketAddr, UdpSocket},
    thread,
    time::Duration,
};

use echonet_probe::{
    catalog::{BASIC_PROPERTIES, DEVICE_CANDIDATES, PROPERTY_GROUPS, SMART_ENERGY_METER},
    client::{PairOutcome, ProbeConfig, Prober},
    encoding::{Frame, Property, ServiceCode},
    transport::{self, Transport, TransportError, UdpTransport},
    ObjectIdentity,
};

/// Simulated ECHONET Lite node: answers only the smart meter's basic
/// property request, every other request times out.
struct SimulatedMeter {
    pending: Option<Vec<u8>>,
    requests: Vec<Frame>,
}

impl SimulatedMeter {
    fn new() -> Self {
        Self {
            pending: None,
            requests: Vec::new(),
        }
    }

    fn reply_to(request: &Frame) -> Option<Vec<u8>> {
        let codes: Vec<u8> = request.properties().iter().map(|p| p.code).collect();
        if request.destination != SMART_ENERGY_METER || codes != BASIC_PROPERTIES.codes {
            return None;
        }
        let reply = Frame::new(
            request.transaction_id,
            SMART_ENERGY_METER,
            request.source,
            ServiceCode::GetRes,
        )
        .with_property(Property::new(0x80, vec![0x30]).unwrap())
        .unwrap()
        .with_property(Property::new(0x84, vec![0x00, 0x96]).unwrap())
        .unwrap();
        Some(reply.encode().to_vec())
    }
}

impl Transport for SimulatedMeter {
    fn send_to(&mut self, data: &[u8], _dest: SocketAddr) -> transport::Result<()> {
        let request = Frame::decode(data).expect("prober sent a malformed frame");
        self.pending = Self::reply_to(&request);
        self.requests.push(request);
        Ok(())
    }

    fn recv_timeout(
        &mut self,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> transport::Result<(usize, SocketAddr)> {
        match self.pending.take() {
            Some(reply) => {
                buffer[..reply.len()].copy_from_slice(&reply);
                Ok((reply.len(), "192.0.2.10:3610".parse().unwrap()))
            }
            None => Err(TransportError::Timeout(timeout)),
        }
    }
}

fn quick_config() -> ProbeConfig {
    ProbeConfig {
        response_timeout: Duration::from_millis(50),
        request_delay: Duration::ZERO,
        ..ProbeConfig::default()
    }
}

fn target() -> SocketAddr {
    "192.0.2.10:3610".parse().unwrap()
}

#[test]
fn meter_readings_in_property_order() {
    let mut meter = SimulatedMeter::new();
    let report = Prober::new(&mut meter, quick_config()).run(target());

    assert!(report.is_success());
    let values: Vec<&str> = report.readings.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, ["ON", "150 W"]);

    for reading in &report.readings {
        assert_eq!(reading.device, "Smart Electric Energy Meter");
        assert_eq!(reading.identity, SMART_ENERGY_METER);
    }
    assert_eq!(report.readings[0].description, "EPC 0x80 (Operation status)");
    assert_eq!(
        report.readings[1].to_string(),
        "Smart Electric Energy Meter - EPC 0x84 (Instantaneous power consumption): 150 W"
    );
}

#[test]
fn every_pair_attempted_once() {
    let mut meter = SimulatedMeter::new();
    let report = Prober::new(&mut meter, quick_config()).run(target());

    let expected = DEVICE_CANDIDATES.len() * PROPERTY_GROUPS.len();
    assert_eq!(expected, 15);
    assert_eq!(meter.requests.len(), expected);
    assert_eq!(report.attempts.len(), expected);
    assert_eq!(report.timeouts(), expected - 1);
    assert_eq!(report.stats.messages_sent, expected as u64);
    assert_eq!(report.stats.messages_received, 1);

    // Requests follow catalogue order: device-major, group-minor
    let pairs: Vec<(ObjectIdentity, Vec<u8>)> = meter
        .requests
        .iter()
        .map(|f| (f.destination, f.properties().iter().map(|p| p.code).collect()))
        .collect();
    let mut i = 0;
    for device in DEVICE_CANDIDATES {
        for group in PROPERTY_GROUPS {
            assert_eq!(pairs[i].0, device.identity);
            assert_eq!(pairs[i].1, group.codes);
            i += 1;
        }
    }
    let distinct: HashSet<_> = pairs.into_iter().collect();
    assert_eq!(distinct.len(), expected);

    for request in &meter.requests {
        assert_eq!(request.service, ServiceCode::Get);
        assert_eq!(request.source, ObjectIdentity::controller());
        assert!(request.properties().iter().all(|p| p.pdc() == 0));
    }

    let received: Vec<_> = report
        .attempts
        .iter()
        .filter(|a| matches!(a.outcome, PairOutcome::Received { .. }))
        .collect();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].device, "Smart Electric Energy Meter");
    assert_eq!(received[0].group, "basic");
}

#[test]
fn silent_node_yields_no_readings() {
    struct Silent(usize);

    impl Transport for Silent {
        fn send_to(&mut self, _data: &[u8], _dest: SocketAddr) -> transport::Result<()> {
            self.0 += 1;
            Ok(())
        }

        fn recv_timeout(
            &mut self,
            _buffer: &mut [u8],
            timeout: Duration,
        ) -> transport::Result<(usize, SocketAddr)> {
            Err(TransportError::Timeout(timeout))
        }
    }

    let mut silent = Silent(0);
    let report = Prober::new(&mut silent, quick_config()).run(target());

    assert!(!report.is_success());
    assert_eq!(silent.0, 15);
    assert!(report
        .attempts
        .iter()
        .all(|a| a.outcome == PairOutcome::TimedOut));
}

#[test]
fn send_failures_do_not_stop_the_sweep() {
    struct Unreachable;

    impl Transport for Unreachable {
        fn send_to(&mut self, _data: &[u8], _dest: SocketAddr) -> transport::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "network unreachable").into())
        }

        fn recv_timeout(
            &mut self,
            _buffer: &mut [u8],
            _timeout: Duration,
        ) -> transport::Result<(usize, SocketAddr)> {
            unreachable!("receive after a failed send")
        }
    }

    let report = Prober::new(Unreachable, quick_config()).run(target());
    assert_eq!(report.attempts.len(), 15);
    assert_eq!(report.stats.errors, 15);
    assert!(report
        .attempts
        .iter()
        .all(|a| matches!(&a.outcome, PairOutcome::Failed(msg) if msg.contains("unreachable"))));
}

#[test]
fn udp_responder_on_loopback() {
    let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
    responder
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let responder_addr = responder.local_addr().unwrap();

    // Answer every request for one sweep; only the meter's basic group gets data
    let handle = thread::spawn(move || {
        let mut buffer = [0u8; 1024];
        for _ in 0..15 {
            let (len, source) = match responder.recv_from(&mut buffer) {
                Ok(received) => received,
                Err(_) => break,
            };
            let request = Frame::decode(&buffer[..len]).unwrap();
            if let Some(reply) = SimulatedMeter::reply_to(&request) {
                responder.send_to(&reply, source).unwrap();
            }
        }
    });

    let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let report = Prober::new(transport, quick_config()).run(responder_addr);
    handle.join().unwrap();

    let values: Vec<&str> = report.readings.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, ["ON", "150 W"]);
    assert_eq!(report.attempts.len(), 15);
    assert_eq!(report.timeouts(), 14);
}

#[test]
fn late_reply_on_loopback_is_discarded() {
    let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
    responder
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let responder_addr = responder.local_addr().unwrap();

    // Every real reply is preceded by one carrying a foreign TID
    let handle = thread::spawn(move || {
        let mut buffer = [0u8; 1024];
        for _ in 0..15 {
            let (len, source) = match responder.recv_from(&mut buffer) {
                Ok(received) => received,
                Err(_) => break,
            };
            let request = Frame::decode(&buffer[..len]).unwrap();
            if let Some(reply) = SimulatedMeter::reply_to(&request) {
                let mut stale = reply.clone();
                stale[2..4].copy_from_slice(&request.transaction_id.wrapping_sub(1).to_be_bytes());
                responder.send_to(&stale, source).unwrap();
                responder.send_to(&reply, source).unwrap();
            }
        }
    });

    let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let report = Prober::new(transport, quick_config()).run(responder_addr);
    handle.join().unwrap();

    let values: Vec<&str> = report.readings.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, ["ON", "150 W"]);
    assert_eq!(report.stats.messages_received, 2);
    assert_eq!(report.timeouts(), 14);
}
