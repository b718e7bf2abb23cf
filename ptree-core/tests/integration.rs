//! Integration tests — frame building through the scheduler, queue and
//! worker pool, with an in-memory transmission channel.

use std::io;
use std::net::Ipv6Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;

use ptree_core::{
    Animation, ByteOffset, ChannelOpener, FrameBuilder, PacketTemplate, Pixel, Scheduler,
    Transmitter, WorkQueue, WorkerPool, redraw_interval,
};

// ── Helpers ──────────────────────────────────────────────────────

/// Shared record of every (packet, address) handed to a channel.
#[derive(Default, Clone)]
struct Wire(Arc<Mutex<Vec<(Vec<u8>, Ipv6Addr)>>>);

struct WireChannel(Wire);

#[async_trait]
impl Transmitter for WireChannel {
    async fn transmit(&mut self, packet: &[u8], dst: Ipv6Addr) -> io::Result<()> {
        self.0.0.lock().unwrap().push((packet.to_vec(), dst));
        Ok(())
    }
}

#[async_trait]
impl ChannelOpener for Wire {
    async fn open(&self) -> io::Result<Box<dyn Transmitter>> {
        Ok(Box::new(WireChannel(self.clone())))
    }
}

fn two_by_two() -> RgbaImage {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // red
    img.put_pixel(1, 0, Rgba([0, 0, 0, 0])); // transparent
    img.put_pixel(0, 1, Rgba([0, 0, 255, 255])); // blue
    img.put_pixel(1, 1, Rgba([0, 255, 0, 255])); // green
    img
}

fn prefix() -> Ipv6Addr {
    "2001:db8::".parse().unwrap()
}

// ── Frame building ───────────────────────────────────────────────

#[test]
fn test_two_by_two_byte_offset() {
    let frame = FrameBuilder::new(&ByteOffset, prefix())
        .build(&two_by_two(), &mut StdRng::seed_from_u64(3));

    let mut addrs = frame.addrs().to_vec();
    addrs.sort();

    let mut expected: Vec<Ipv6Addr> = [
        "2001:db8:0:0:0:0:0:ffff", // (0,0) red:   b=00 g=00 r=ff a=ff
        "2001:db8:0:0:0:1:ff00:ff", // (0,1) blue:  b=ff g=00 r=00 a=ff
        "2001:db8:0:0:1:1:ff:ff", // (1,1) green: b=00 g=ff r=00 a=ff
    ]
    .iter()
    .map(|s| s.parse().unwrap())
    .collect();
    expected.sort();

    assert_eq!(addrs, expected);
    for addr in frame.addrs() {
        let (_, _, px) = ByteOffset::decode(*addr);
        assert_ne!(px, Pixel::new(0, 0, 0, 0));
    }
}

// ── Pipeline ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_run_once_pipeline() {
    let wire = Wire::default();
    let interval = redraw_interval(5);
    let frame = FrameBuilder::new(&ByteOffset, prefix())
        .with_offset(100, 50)
        .build(&two_by_two(), &mut StdRng::seed_from_u64(9));
    let expected = frame.addrs().to_vec();
    let anim = Animation::still(frame, interval);

    let (tx, rx) = WorkQueue::bounded(anim.largest_frame());
    assert_eq!(tx.capacity(), 3);

    let shutdown = CancellationToken::new();
    let pool = WorkerPool::spawn(2, Arc::new(wire.clone()), PacketTemplate::echo_request(), rx);
    let stats = Scheduler::new(anim, tx, interval, shutdown.clone())
        .run_once(true)
        .run()
        .await
        .unwrap();
    assert!(shutdown.is_cancelled());
    assert_eq!(stats.addrs, 3);

    let sent = pool.join(&shutdown).await.unwrap();
    assert_eq!(sent.sent, 3);

    let log = wire.0.lock().unwrap().clone();
    assert_eq!(log.len(), 3);
    let mut got: Vec<_> = log.iter().map(|(_, a)| *a).collect();
    let mut want = expected;
    got.sort();
    want.sort();
    assert_eq!(got, want);
    assert!(log.iter().all(|(pkt, _)| pkt == PacketTemplate::echo_request().as_bytes()));
}

#[tokio::test(start_paused = true)]
async fn test_continuous_until_shutdown() {
    let wire = Wire::default();
    let interval = Duration::from_millis(100);
    let frame = FrameBuilder::new(&ByteOffset, prefix())
        .build(&two_by_two(), &mut StdRng::seed_from_u64(1));
    let anim = Animation::still(frame, interval);

    let (tx, rx) = WorkQueue::bounded(anim.largest_frame());
    let shutdown = CancellationToken::new();
    let pool = WorkerPool::spawn(1, Arc::new(wire.clone()), PacketTemplate::echo_request(), rx);
    let scheduler = tokio::spawn(Scheduler::new(anim, tx, interval, shutdown.clone()).run());

    tokio::time::sleep(Duration::from_millis(450)).await;
    shutdown.cancel();
    let stats = scheduler.await.unwrap().unwrap();
    pool.join(&shutdown).await.unwrap();

    // Passes at 0, 100, 200, 300, 400.
    assert_eq!(stats.passes, 5);
    assert_eq!(wire.0.lock().unwrap().len(), 15);
}
