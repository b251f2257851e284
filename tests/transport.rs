//! Message transports against fake servers on the loopback interface.

mod support;

use domain_stub::base::{Question, RecordData, Rtype};
use domain_stub::net::client::pool::TransportPool;
use domain_stub::net::client::tcp::TcpConnect;
use domain_stub::net::client::transport::{Config, MessageTransport};
use domain_stub::net::client::udp::UdpConnect;
use domain_stub::net::client::Error;
use std::time::Duration;
use support::{a, init_logging, name, silent, tcp_server, udp_server, zone};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn udp_query() {
    init_logging();
    let addr = udp_server(zone(vec![a("example.com", "192.0.2.1")])).await;
    let transport =
        MessageTransport::connect(&UdpConnect::new(addr), Config::new())
            .await
            .unwrap();
    let question = Question::new_in(name("example.com"), Rtype::A);
    let answer = transport.ask(&question, TIMEOUT, None).await.unwrap();
    assert!(answer.is_answer_to(&question));
    assert_eq!(
        answer.answer()[0].data(),
        &RecordData::A("192.0.2.1".parse().unwrap())
    );
    assert_eq!(transport.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn tcp_concurrent_queries() {
    init_logging();
    let records = (0..20)
        .map(|i| a(&format!("host{}.example.com", i), &format!("192.0.2.{}", i)))
        .collect();
    let addr = tcp_server(zone(records)).await;
    let transport =
        MessageTransport::connect(&TcpConnect::new(addr), Config::new())
            .await
            .unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let transport = transport.clone();
            tokio::spawn(async move {
                let question = Question::new_in(
                    name(&format!("host{}.example.com", i)),
                    Rtype::A,
                );
                let answer =
                    transport.ask(&question, TIMEOUT, None).await.unwrap();
                assert!(answer.is_answer_to(&question));
                answer.answer()[0].data().clone()
            })
        })
        .collect();
    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(
            task.await.unwrap(),
            RecordData::A(format!("192.0.2.{}", i).parse().unwrap())
        );
    }
}

#[tokio::test]
async fn silent_server_times_out() {
    init_logging();
    let addr = udp_server(silent()).await;
    let transport =
        MessageTransport::connect(&UdpConnect::new(addr), Config::new())
            .await
            .unwrap();
    let question = Question::new_in(name("example.com"), Rtype::A);
    let res = transport
        .ask(&question, Duration::from_millis(100), None)
        .await;
    assert!(matches!(res, Err(Error::Timeout)));
    assert_eq!(transport.pending_count(), 0);
    assert!(transport.is_alive());
}

#[tokio::test]
async fn pool_shares_transports() {
    init_logging();
    let addr = udp_server(zone(vec![a("example.com", "192.0.2.1")])).await;
    let pool = TransportPool::new(Config::new(), Duration::from_secs(10));
    let question = Question::new_in(name("example.com"), Rtype::A);
    for _ in 0..3 {
        let transport = pool.udp(addr).await.unwrap();
        transport.ask(&question, TIMEOUT, None).await.unwrap();
    }
    assert_eq!(pool.len(), 1);
    pool.close();
    assert!(pool.is_empty());
}
