//! Shared mock-server plumbing for integration tests.
//!
//! The mock speaks just enough of the server side of the protocol to
//! exercise the client: banner, device subscription replies, and scripted
//! message sequences.

#![allow(dead_code)] // not every test binary uses every helper

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

use player_client::protocol::{
    BANNER_SIZE, HEADER_SIZE, XdrDecoder, XdrEncoder,
};
use player_client::{DeviceAddress, MessageHeader, MessageType};

/// Spawn a one-connection mock server; returns its address and join handle.
pub fn spawn_server<F>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream.set_nodelay(true).ok();
        script(stream);
    });
    (addr, handle)
}

pub fn write_banner(stream: &mut TcpStream) {
    let mut banner = [0u8; BANNER_SIZE];
    banner[..13].copy_from_slice(b"Player v3.1.0");
    stream.write_all(&banner).expect("banner");
}

/// Read one message from the client; returns its header and body bytes.
pub fn read_client_message(stream: &mut TcpStream) -> (MessageHeader, Vec<u8>) {
    let mut header_buf = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header_buf).expect("client header");
    let header = MessageHeader::from_bytes(&header_buf).expect("parse header");
    let mut body = vec![0u8; header.size() as usize];
    stream.read_exact(&mut body).expect("client body");
    (header, body)
}

/// Write one message to the client.
pub fn write_message(
    stream: &mut TcpStream,
    address: DeviceAddress,
    msg_type: MessageType,
    subtype: u32,
    body: &[u8],
) {
    let header = MessageHeader::new(address, msg_type, subtype, body.len() as u32);
    stream.write_all(&header.to_bytes()).expect("header");
    stream.write_all(body).expect("body");
}

/// Address the mock's core meta-device answers from.
pub fn core_address() -> DeviceAddress {
    DeviceAddress {
        host: 7,
        robot: 6665,
        interf: 1,
        index: 0,
    }
}

/// Serve one `REQ_DEV` subscription: read the request, grant the asked
/// access level, return the granted device address.
pub fn serve_subscription(stream: &mut TcpStream) -> DeviceAddress {
    let (header, body) = read_client_message(stream);
    assert_eq!(header.msg_type(), MessageType::Request);
    assert_eq!(header.subtype(), 1, "expected REQ_DEV");

    let mut dec = XdrDecoder::new(&body);
    let _host = dec.u32().unwrap();
    let _robot = dec.u32().unwrap();
    let interf = dec.u32().unwrap() as u16;
    let index = dec.u32().unwrap() as u16;
    let access = dec.u32().unwrap() as u8;

    let granted = DeviceAddress {
        host: 7,
        robot: 6665,
        interf,
        index,
    };

    let driver = b"mockdriver";
    let mut enc = XdrEncoder::new();
    enc.u32(granted.host);
    enc.u32(granted.robot);
    enc.u32(u32::from(granted.interf));
    enc.u32(u32::from(granted.index));
    enc.byte(access);
    enc.u32(driver.len() as u32);
    enc.u32(driver.len() as u32);
    enc.opaque(driver);

    write_message(
        stream,
        core_address(),
        MessageType::ResponseAck,
        1,
        &enc.into_bytes(),
    );
    granted
}
