// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex as PlMutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[test]
fn same_seed_reproduces_the_arrival_sequence() {
    let mut a = StdRng::seed_from_u64(42);
    let mut b = StdRng::seed_from_u64(42);
    for _ in 0..1000 {
        assert_eq!(next_delay(&mut a, 3.0), next_delay(&mut b, 3.0));
    }
}

#[test]
fn different_seeds_diverge() {
    let mut a = StdRng::seed_from_u64(42);
    let mut b = StdRng::seed_from_u64(43);
    let delays_a: Vec<_> = (0..16).map(|_| next_delay(&mut a, 3.0)).collect();
    let delays_b: Vec<_> = (0..16).map(|_| next_delay(&mut b, 3.0)).collect();
    assert_ne!(delays_a, delays_b);
}

#[test]
fn mean_delay_converges_to_inverse_rate() {
    let rate = 4.0;
    let mut rng = StdRng::seed_from_u64(42);
    let n = 20_000;
    let total: f64 = (0..n).map(|_| next_delay(&mut rng, rate).as_secs_f64()).sum();
    let mean = total / n as f64;
    // Exp(rate) mean is 1/rate = 0.25; stderr at n=20k is ~0.0018.
    assert!((mean - 0.25).abs() < 0.01, "mean was {mean}");
}

#[test]
fn delays_are_positive_and_finite() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10_000 {
        let d = next_delay(&mut rng, 100.0);
        assert!(d > Duration::ZERO);
        assert!(d < Duration::from_secs(3600));
    }
}

/// Counts connections; answers 200 to each.
async fn counting_server() -> (String, Arc<PlMutex<u32>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let count = Arc::new(PlMutex::new(0u32));
    let counter = count.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else { return };
            *counter.lock() += 1;
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}")
                    .await;
            });
        }
    });
    (addr, count)
}

#[tokio::test]
async fn zero_rate_sends_nothing_and_returns() {
    let (addr, count) = counting_server().await;
    let generator =
        NoiseGenerator::new(EngineKind::Vllm, &format!("http://{addr}"), "m", 0.0, 42).unwrap();
    tokio::time::timeout(Duration::from_millis(200), generator.run()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*count.lock(), 0);
}

#[tokio::test]
async fn cancellation_stops_the_arrival_process() {
    let (addr, count) = counting_server().await;
    let generator =
        NoiseGenerator::new(EngineKind::Vllm, &format!("http://{addr}"), "m", 200.0, 42).unwrap();
    let cancel = generator.cancel_token();

    let run = tokio::spawn(generator.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), run).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let sent = *count.lock();
    assert!(sent > 0, "expected some arrivals at 200 req/s over 100ms");

    // No further arrivals after cancellation.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*count.lock(), sent);
}

#[tokio::test]
async fn request_failures_are_swallowed() {
    // Nothing listening: every request fails, the generator keeps going.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    drop(listener);

    let generator = NoiseGenerator::new(EngineKind::Sglang, &url, "m", 100.0, 42).unwrap();
    let cancel = generator.cancel_token();
    let run = tokio::spawn(generator.run());
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
}
