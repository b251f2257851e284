//! Fake name servers for the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use domain_stub::base::{
    Class, Dname, Message, MessageBuilder, Rcode, Record, RecordData,
};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

/// Produces the wire format response to a query or nothing at all.
pub type Responder = Arc<dyn Fn(&Message) -> Option<Vec<u8>> + Send + Sync>;

pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .try_init()
        .ok();
}

pub fn name(s: &str) -> Dname {
    Dname::from_str(s).unwrap()
}

pub fn a(owner: &str, addr: &str) -> Record {
    Record::new(name(owner), Class::IN, 300, RecordData::A(addr.parse().unwrap()))
}

pub fn aaaa(owner: &str, addr: &str) -> Record {
    Record::new(
        name(owner),
        Class::IN,
        300,
        RecordData::Aaaa(addr.parse().unwrap()),
    )
}

pub fn cname(owner: &str, target: &str) -> Record {
    Record::new(name(owner), Class::IN, 300, RecordData::Cname(name(target)))
}

pub fn ptr(owner: &str, target: &str) -> Record {
    Record::new(name(owner), Class::IN, 300, RecordData::Ptr(name(target)))
}

/// Builds a response to `query` with the given answer records.
pub fn reply(query: &Message, rcode: Rcode, answer: &[Record]) -> Vec<u8> {
    let mut builder = MessageBuilder::start_answer(query).unwrap();
    builder.header_mut().set_rcode(rcode);
    for record in answer {
        builder.push_answer(record).unwrap();
    }
    builder.finish()
}

/// Builds a truncated, empty response to `query`.
pub fn truncated(query: &Message) -> Vec<u8> {
    let mut builder = MessageBuilder::start_answer(query).unwrap();
    builder.header_mut().set_tc(true);
    builder.finish()
}

/// Answers every query with the records from `records` it asks for.
///
/// Records are selected by owner and type. CNAME records for the
/// question name are always included. Names without records get
/// NXDOMAIN.
pub fn zone(records: Vec<Record>) -> Responder {
    Arc::new(move |query: &Message| {
        let question = query.first_question()?;
        let mut owner = question.qname().clone();
        let mut answer = Vec::new();
        for _ in 0..records.len() {
            let cname = records.iter().find(|record| {
                *record.owner() == owner
                    && matches!(record.data(), RecordData::Cname(_))
            });
            match cname {
                Some(record) => {
                    answer.push(record.clone());
                    if let RecordData::Cname(target) = record.data() {
                        owner = target.clone();
                    }
                }
                None => break,
            }
        }
        answer.extend(
            records
                .iter()
                .filter(|record| {
                    *record.owner() == owner
                        && record.rtype() == question.qtype()
                })
                .cloned(),
        );
        let known = records.iter().any(|record| *record.owner() == owner);
        let rcode = if known { Rcode::NOERROR } else { Rcode::NXDOMAIN };
        Some(reply(query, rcode, &answer))
    })
}

/// Answers every query with the given response code.
pub fn rcode(rcode: Rcode) -> Responder {
    Arc::new(move |query: &Message| Some(reply(query, rcode, &[])))
}

/// Answers every query with an empty, truncated response.
pub fn truncating() -> Responder {
    Arc::new(|query: &Message| Some(truncated(query)))
}

/// Never answers.
pub fn silent() -> Responder {
    Arc::new(|_: &Message| -> Option<Vec<u8>> { None })
}

/// Starts a UDP server on a fresh loopback port.
pub async fn udp_server(responder: Responder) -> SocketAddr {
    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = sock.local_addr().unwrap();
    tokio::spawn(serve_udp(sock, responder));
    addr
}

/// Starts a TCP server on a fresh loopback port.
pub async fn tcp_server(responder: Responder) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_tcp(listener, responder));
    addr
}

/// Starts a UDP and a TCP server on the same loopback port.
pub async fn dual_server(udp: Responder, tcp: Responder) -> SocketAddr {
    for _ in 0..10 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        if let Ok(sock) = UdpSocket::bind(addr).await {
            tokio::spawn(serve_udp(sock, udp));
            tokio::spawn(serve_tcp(listener, tcp));
            return addr;
        }
    }
    panic!("no free port for both UDP and TCP");
}

async fn serve_udp(sock: UdpSocket, responder: Responder) {
    let mut buf = vec![0; 4096];
    loop {
        let (len, peer) = match sock.recv_from(&mut buf).await {
            Ok(res) => res,
            Err(_) => return,
        };
        let query =
            match Message::from_octets(Bytes::copy_from_slice(&buf[..len])) {
                Ok(query) => query,
                Err(_) => continue,
            };
        if let Some(response) = responder(&query) {
            let _ = sock.send_to(&response, peer).await;
        }
    }
}

async fn serve_tcp(listener: TcpListener, responder: Responder) {
    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(serve_tcp_conn(stream, responder.clone()));
    }
}

async fn serve_tcp_conn(mut stream: TcpStream, responder: Responder) {
    loop {
        let len = match stream.read_u16().await {
            Ok(len) => usize::from(len),
            Err(_) => return,
        };
        let mut buf = vec![0; len];
        if stream.read_exact(&mut buf).await.is_err() {
            return;
        }
        let query = match Message::from_octets(Bytes::from(buf)) {
            Ok(query) => query,
            Err(_) => return,
        };
        if let Some(response) = responder(&query) {
            let Ok(len) = u16::try_from(response.len()) else {
                return;
            };
            let mut frame = len.to_be_bytes().to_vec();
            frame.extend_from_slice(&response);
            if stream.write_all(&frame).await.is_err() {
                return;
            }
        }
    }
}
