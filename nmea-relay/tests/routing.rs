//! End-to-end routing tests
//!
//! Input comes from a scripted `MockTransport`; output goes either to a real
//! loopback UDP socket or to a mock serial writer.

use chrono::NaiveDate;
use nmea_relay::nmea::{DateFieldFix, FixedClock, FrameProcessor};
use nmea_relay::transport::{MockTransport, Sink};
use nmea_relay::{Destination, InvalidFramePolicy, Relay, RelayState};
use std::net::UdpSocket;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

const GGA: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
const VTG: &[u8] = b"$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n";
const RMC_IN: &[u8] = b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,021227,003.1,W*61\r\n";
const RMC_OUT: &[u8] =
    b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,010424,021227,003.1,W*4E\r\n";

fn processor() -> FrameProcessor<FixedClock> {
    let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    FrameProcessor::new(DateFieldFix::default(), FixedClock(date))
}

fn scripted_input() -> MockTransport {
    let input = MockTransport::new();
    input.inject_read(GGA);
    input.inject_timeout();
    input.inject_read(RMC_IN);
    input.inject_read(VTG);
    input
}

#[test]
fn test_udp_destination_one_datagram_per_frame() {
    env_logger::try_init().ok();

    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    let destination = Destination::Udp {
        host: "127.0.0.1".to_string(),
        port: receiver.local_addr().unwrap().port(),
    };

    let sink = Sink::open(&destination).unwrap();
    assert!(matches!(sink, Sink::Udp(_)));

    let mut relay = Relay::new(
        scripted_input(),
        sink,
        processor(),
        InvalidFramePolicy::Abort,
    );
    let stats = relay.run(&AtomicBool::new(true)).unwrap();
    assert_eq!(relay.state(), RelayState::Stopped);
    assert_eq!(stats.frames_forwarded, 3);
    assert_eq!(stats.frames_rewritten, 1);

    let mut buf = [0u8; 1024];
    for expected in [GGA, RMC_OUT, VTG] {
        let (n, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], expected);
    }

    // Nothing beyond the three frames
    receiver
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(receiver.recv_from(&mut buf).is_err());
}

#[test]
fn test_serial_destination_one_write_per_frame() {
    env_logger::try_init().ok();

    let output = MockTransport::new();
    let mut relay = Relay::new(
        scripted_input(),
        Sink::stream(output.clone()),
        processor(),
        InvalidFramePolicy::Abort,
    );
    relay.run(&AtomicBool::new(true)).unwrap();

    assert_eq!(
        output.get_writes(),
        vec![GGA.to_vec(), RMC_OUT.to_vec(), VTG.to_vec()]
    );
    assert!(output.get_written().ends_with(b"\r\n"));
}

#[test]
fn test_frame_split_across_timeouts_arrives_whole() {
    let input = MockTransport::new();
    input.inject_read(&RMC_IN[..20]);
    input.inject_timeout();
    input.inject_timeout();
    input.inject_read(&RMC_IN[20..]);

    let output = MockTransport::new();
    let mut relay = Relay::new(
        input,
        Sink::stream(output.clone()),
        processor(),
        InvalidFramePolicy::Abort,
    );
    relay.run(&AtomicBool::new(true)).unwrap();

    assert_eq!(output.get_writes(), vec![RMC_OUT.to_vec()]);
}
