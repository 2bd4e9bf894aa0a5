use chatpane::{CharQueue, OverflowPolicy};
use std::time::Duration;

#[test]
fn test_full_queue_drops_oldest() {
    let queue = CharQueue::new(4);
    assert_eq!(queue.put_str("HELLO"), 5);
    let drained: String = std::iter::from_fn(|| queue.get()).collect();
    assert_eq!(drained, "ELLO");
    assert_eq!(queue.evicted(), 1);
}

#[test]
fn test_drop_newest_keeps_head() {
    let queue = CharQueue::with_policy(4, OverflowPolicy::DropNewest);
    queue.put_str("HELLO");
    let drained: String = std::iter::from_fn(|| queue.get()).collect();
    assert_eq!(drained, "HELL");
    assert_eq!(queue.evicted(), 1);
}

#[test]
fn test_len_never_exceeds_capacity() {
    let queue = CharQueue::new(8);
    for ch in "the quick brown fox".chars() {
        queue.put(ch);
        assert!(queue.len() <= queue.capacity());
    }
    assert_eq!(queue.len(), 8);
}

#[test]
fn test_producer_and_consumer_threads() {
    let queue = CharQueue::new(64);
    let producer = {
        let queue = queue.clone();
        std::thread::spawn(move || {
            for _ in 0..1000 {
                queue.put('x');
            }
        })
    };
    let mut received = 0u64;
    while !producer.is_finished() || !queue.is_empty() {
        if queue.get().is_some() {
            received += 1;
        }
    }
    producer.join().unwrap();
    assert_eq!(received + queue.evicted(), 1000);
}

#[tokio::test(start_paused = true)]
async fn test_flush_wait_is_bounded() {
    let queue = CharQueue::new(4);
    queue.put('z');
    let start = tokio::time::Instant::now();
    let drained = queue
        .wait_until_empty(Duration::from_millis(10), Duration::from_millis(100))
        .await;
    assert!(!drained);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(start.elapsed() < Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn test_flush_on_empty_queue_returns_immediately() {
    let queue = CharQueue::new(4);
    let start = tokio::time::Instant::now();
    assert!(
        queue
            .wait_until_empty(Duration::from_millis(10), Duration::from_secs(30))
            .await
    );
    assert_eq!(start.elapsed(), Duration::ZERO);
}
