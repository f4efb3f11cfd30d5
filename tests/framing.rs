//! Stream framing regression tests: padding, unknown devices, short reads.

mod common;

use common::{serve_subscription, spawn_server, write_banner, write_message};
use player_client::protocol::XdrEncoder;
use player_client::{Client, DeviceAddress, Dispatch, Error, MessageType};

fn opaque_body(blob: &[u8]) -> Vec<u8> {
    let mut enc = XdrEncoder::new();
    enc.array_len(blob.len() as u32);
    enc.opaque(blob);
    enc.into_bytes().to_vec()
}

#[test]
fn consecutive_odd_length_payloads_stay_framed() {
    // A decoder that fails to consume the XDR pad bytes desynchronizes on
    // the second message; both must decode intact.
    let (addr, server) = spawn_server(|mut stream| {
        write_banner(&mut stream);
        let granted = serve_subscription(&mut stream);

        write_message(
            &mut stream,
            granted,
            MessageType::Data,
            1,
            &opaque_body(b"abc"),
        );
        write_message(
            &mut stream,
            granted,
            MessageType::Data,
            1,
            &opaque_body(b"defgh"),
        );
    });

    let mut client = Client::connect(addr).unwrap();
    let opaque = client.opaque(0).unwrap();

    client.read_message().unwrap();
    assert_eq!(opaque.data().unwrap().as_ref(), b"abc");

    client.read_message().unwrap();
    assert_eq!(opaque.data().unwrap().as_ref(), b"defgh");

    server.join().unwrap();
}

#[test]
fn unknown_device_is_surfaced_after_draining() {
    let (addr, server) = spawn_server(|mut stream| {
        write_banner(&mut stream);
        let granted = serve_subscription(&mut stream);

        // message for a device nothing is registered under
        let stray = DeviceAddress {
            host: 7,
            robot: 6665,
            interf: 99,
            index: 0,
        };
        write_message(&mut stream, stray, MessageType::Data, 1, &[0u8; 16]);

        // the stream is still aligned afterwards
        let mut enc = XdrEncoder::new();
        enc.byte(0);
        enc.u32(0);
        enc.byte(0);
        write_message(&mut stream, granted, MessageType::Data, 1, &enc.into_bytes());
    });

    let mut client = Client::connect(addr).unwrap();
    let gripper = client.gripper(0).unwrap();

    let err = client.read_message().unwrap_err();
    assert!(matches!(err, Error::UnknownDevice { address } if address.interf == 99));

    // degraded-mode recovery: the next message still dispatches
    assert!(matches!(
        client.read_message().unwrap(),
        Dispatch::Data(_)
    ));
    assert!(gripper.is_data_ready());

    server.join().unwrap();
}

#[test]
fn truncated_header_is_fatal() {
    let (addr, server) = spawn_server(|mut stream| {
        write_banner(&mut stream);
        let granted = serve_subscription(&mut stream);

        // half a header, then hang up
        let header = player_client::MessageHeader::new(granted, MessageType::Data, 1, 0);
        use std::io::Write;
        stream.write_all(&header.to_bytes()[..20]).unwrap();
    });

    let mut client = Client::connect(addr).unwrap();
    let _gripper = client.gripper(0).unwrap();

    let err = client.read_message().unwrap_err();
    assert!(matches!(err, Error::ShortHeader { .. } | Error::Io(_)));

    server.join().unwrap();
}

#[test]
fn declared_size_frames_the_stream_not_the_payload_shape() {
    // A body larger than the decoder expects leaves trailing bytes, which
    // is a fatal framing error rather than silent misalignment.
    let (addr, server) = spawn_server(|mut stream| {
        write_banner(&mut stream);
        let granted = serve_subscription(&mut stream);

        let mut enc = XdrEncoder::new();
        enc.byte(0);
        enc.u32(0);
        enc.byte(0);
        enc.u32(0xDEAD); // 4 bytes the gripper decoder will not consume
        write_message(&mut stream, granted, MessageType::Data, 1, &enc.into_bytes());
    });

    let mut client = Client::connect(addr).unwrap();
    let _gripper = client.gripper(0).unwrap();

    let err = client.read_message().unwrap_err();
    assert!(matches!(
        err,
        Error::TrailingBytes {
            remaining: 4,
            size: 16
        }
    ));

    server.join().unwrap();
}
