//! Pool-level attach-policy scenarios: spec.md §8's P9, S4, S5, S6.

use std::sync::{Arc, Mutex};

use relation_client::consumer::NoopConnection;
use relation_client::message::Message;
use relation_client::pool::{ConsumerPool, DialFn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn test_dial() -> DialFn {
    Arc::new(move |_bindings: Vec<String>| {
        Box::pin(async move {
            let (_tx, rx) = mpsc::channel(16);
            Ok((rx, Box::new(NoopConnection) as Box<dyn relation_client::consumer::BrokerConnection>))
        })
    })
}

/// A dial function that remembers every feed's sender, keyed by creation
/// order, so a test can push a message straight into one specific
/// consumer's delivery feed after the fact.
fn tracking_dial() -> (DialFn, Arc<Mutex<Vec<mpsc::Sender<Message>>>>) {
    let senders = Arc::new(Mutex::new(Vec::new()));
    let captured = senders.clone();
    let dial: DialFn = Arc::new(move |_bindings: Vec<String>| {
        let captured = captured.clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(16);
            captured.lock().unwrap().push(tx);
            Ok((rx, Box::new(NoopConnection) as Box<dyn relation_client::consumer::BrokerConnection>))
        })
    });
    (dial, senders)
}

/// P9: over K consumers and K sequential round-robin attach calls, each
/// consumer gains exactly one receiver.
#[tokio::test]
async fn round_robin_visits_every_consumer_once() {
    let (dial, senders) = tracking_dial();
    let pool = ConsumerPool::new(dial, None);
    let ctx = CancellationToken::new();

    for _ in 0..3 {
        pool.listen_detached(vec![], ctx.clone()).await.unwrap();
    }

    let mut attached: Vec<mpsc::Receiver<Message>> = Vec::new();
    for _ in 0..3 {
        attached.push(pool.listen_attached(ctx.clone()).await.unwrap());
    }

    let senders = senders.lock().unwrap().clone();
    assert_eq!(senders.len(), 3);
    for (idx, tx) in senders.iter().enumerate() {
        tx.send(Message::new("tag", vec![idx as u8])).await.unwrap();
    }

    let mut tags_seen = std::collections::HashSet::new();
    for rx in attached.iter_mut() {
        let msg = rx.recv().await.expect("round-robin receiver should see its consumer's message");
        tags_seen.insert(msg.data[0]);
    }
    assert_eq!(tags_seen, (0u8..3).collect());
}

/// S4/S5: ListenDetached, ListenDetached, ListenAttached(last), ListenAttached(last)
/// groups three receivers on the second consumer; cancelling the second
/// detached root tears down all three, leaving the first untouched.
#[tokio::test]
async fn grouped_attach_and_detached_cancel_closes_group() {
    let pool = ConsumerPool::new(test_dial(), None);

    let ctx_first = CancellationToken::new();
    let mut first_root = pool.listen_detached(vec![], ctx_first.clone()).await.unwrap();

    let ctx_second = CancellationToken::new();
    let mut second_root = pool.listen_detached(vec![], ctx_second.clone()).await.unwrap();

    let ctx_a = CancellationToken::new();
    let mut second_a = pool.listen_attached_last(ctx_a.clone()).await.unwrap();
    let ctx_b = CancellationToken::new();
    let mut second_b = pool.listen_attached_last(ctx_b.clone()).await.unwrap();

    ctx_second.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(second_root.recv().await.is_none());
    assert!(second_a.recv().await.is_none());
    assert!(second_b.recv().await.is_none());

    // first consumer is untouched; its channel stays open (no message, but
    // not closed either).
    assert!(matches!(first_root.try_recv(), Err(mpsc::error::TryRecvError::Empty)));
}

/// S6: attaching to an empty pool with `listen_attached_last` fails and
/// never creates a connection.
#[tokio::test]
async fn attached_last_on_empty_pool_fails() {
    let pool = ConsumerPool::new(test_dial(), None);
    let ctx = CancellationToken::new();
    let result = pool.listen_attached_last(ctx).await;
    assert!(result.is_err());
}
