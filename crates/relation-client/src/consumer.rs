//! A single client-side broker connection multiplexed to many receivers.
//!
//! Ported from `original_source/client/consumer.go`'s `consumer` struct
//! (whose body was elided in the retrieved source) with the fan-out/attach/
//! detach/shutdown/redial state machine filled in entirely from spec.md
//! §4.G/§5/§8/§9. `tokio::sync::mpsc` channels stand in for Go's unbuffered
//! channels, `tokio_util::sync::CancellationToken` for a caller-supplied
//! `context.Context`, and `tokio::time::interval` for `time.Ticker`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use relation_domain::{ErrorCode, RelationError};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// Per-receiver channel capacity. Go's channels in the source are
/// unbuffered; a small buffer is the idiomatic Rust equivalent and does not
/// change the fan-out ordering guarantees (P5).
const RECEIVER_BUFFER: usize = 16;

pub type DeliveryFeed = mpsc::Receiver<Message>;

/// Re-establishes a delivery feed against the broker. `None` when the pool
/// was built with no pulse (redial disabled).
pub type RedialFn = Box<
    dyn Fn() -> Pin<Box<dyn Future<Output = Result<DeliveryFeed, RelationError>> + Send>>
        + Send
        + Sync,
>;

/// The underlying broker connection a consumer owns. Closing it is what
/// makes the fan-out loop's delivery feed end during a deliberate shutdown;
/// test doubles can no-op this since their feed is driven directly.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    async fn close(&self);
}

pub struct NoopConnection;

#[async_trait]
impl BrokerConnection for NoopConnection {
    async fn close(&self) {}
}

struct ConsumerTasks {
    fanout: Option<JoinHandle<()>>,
    redial: Option<JoinHandle<()>>,
}

/// One broker connection fanning deliveries out to every attached receiver.
/// See spec.md §4.G for the full state machine this realizes.
pub struct Consumer {
    closed: AtomicBool,
    receivers: TokioMutex<HashMap<u64, mpsc::Sender<Message>>>,
    next_id: AtomicU64,
    done_tx: mpsc::Sender<()>,
    done_rx: TokioMutex<mpsc::Receiver<()>>,
    cancel: CancellationToken,
    pulse: Option<Duration>,
    redial: StdMutex<Option<RedialFn>>,
    tasks: StdMutex<ConsumerTasks>,
    conn: Box<dyn BrokerConnection>,
}

impl Consumer {
    /// Starts RUNNING: a fan-out task is live immediately, and a redial task
    /// too if `pulse` is set.
    pub fn spawn(
        feed: DeliveryFeed,
        pulse: Option<Duration>,
        redial: Option<RedialFn>,
        conn: Box<dyn BrokerConnection>,
    ) -> Arc<Self> {
        let (done_tx, done_rx) = mpsc::channel(1);
        let consumer = Arc::new(Consumer {
            closed: AtomicBool::new(false),
            receivers: TokioMutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            done_tx,
            done_rx: TokioMutex::new(done_rx),
            cancel: CancellationToken::new(),
            pulse,
            redial: StdMutex::new(redial),
            tasks: StdMutex::new(ConsumerTasks { fanout: None, redial: None }),
            conn,
        });

        let fanout_handle = tokio::spawn(fanout_loop(consumer.clone(), feed));
        consumer.tasks.lock().unwrap().fanout = Some(fanout_handle);

        if consumer.pulse.is_some() {
            let redial_handle = tokio::spawn(redial_loop(consumer.clone()));
            consumer.tasks.lock().unwrap().redial = Some(redial_handle);
        }

        consumer
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Registers a new receiver. Errors with a `consumer closed` message if
    /// the closed flag is already set.
    pub async fn attach_recv(&self) -> Result<(u64, mpsc::Receiver<Message>), RelationError> {
        if self.is_closed() {
            return Err(RelationError::new(ErrorCode::Internal, "consumer closed"));
        }
        let (tx, rx) = mpsc::channel(RECEIVER_BUFFER);
        let mut receivers = self.receivers.lock().await;
        if self.is_closed() {
            return Err(RelationError::new(ErrorCode::Internal, "consumer closed"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        receivers.insert(id, tx);
        Ok((id, rx))
    }

    /// Detaches receiver `id`. If it's the root, or removing it would empty
    /// the registry, the whole consumer is torn down; returns `true` in
    /// that case (the "empty consumer" sentinel — the caller must not
    /// separately close the channel, `shutdown` already did).
    pub async fn remove_recv(self: &Arc<Self>, id: u64, is_root: bool) -> bool {
        let should_shutdown = {
            let mut receivers = self.receivers.lock().await;
            receivers.remove(&id);
            is_root || receivers.is_empty()
        };
        if should_shutdown {
            self.shutdown().await;
            true
        } else {
            false
        }
    }

    /// Idempotent: a second call is a no-op (R2).
    pub async fn shutdown(self: &Arc<Self>) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.cancel.cancel();
        self.conn.close().await;
        if let Some(h) = self.tasks.lock().unwrap().redial.take() {
            h.abort();
        }
        self.close_all_receivers().await;

        let mut done_rx = self.done_rx.lock().await;
        let _ = done_rx.recv().await;
        true
    }

    async fn close_all_receivers(&self) {
        let mut receivers = self.receivers.lock().await;
        receivers.clear();
    }
}

/// Reads deliveries until the feed ends (broker connection dropped) or the
/// consumer is cancelled via `shutdown`. See spec.md's "Fan-out loop exit"
/// paragraph for the abnormal-termination distinction.
async fn fanout_loop(consumer: Arc<Consumer>, mut feed: DeliveryFeed) {
    loop {
        tokio::select! {
            _ = consumer.cancel.cancelled() => break,
            delivered = feed.recv() => {
                match delivered {
                    Some(msg) => {
                        let receivers = consumer.receivers.lock().await;
                        for tx in receivers.values() {
                            if tx.send(msg.clone()).await.is_err() {
                                warn!("receiver channel dropped without detaching");
                            }
                        }
                    }
                    None => break,
                }
            }
        }
    }

    if !consumer.cancel.is_cancelled() {
        // The feed ended on its own, not via a deliberate shutdown.
        if consumer.pulse.is_none() {
            consumer.closed.store(true, Ordering::SeqCst);
            consumer.close_all_receivers().await;
        }
        // else: redial_loop owns recovery; leave `closed` false.
    }

    let _ = consumer.done_tx.send(()).await;
}

/// Only spawned when `pulse.is_some()`. Polls the done handshake each tick
/// and attempts the full recovery sequence on a dead fan-out loop.
async fn redial_loop(consumer: Arc<Consumer>) {
    let pulse = consumer.pulse.expect("redial_loop spawned without a pulse");
    let mut ticker = tokio::time::interval(pulse);
    ticker.tick().await; // first tick fires immediately; skip it

    loop {
        ticker.tick().await;
        if consumer.is_closed() {
            break;
        }

        let signalled = {
            let mut done_rx = consumer.done_rx.lock().await;
            done_rx.try_recv().is_ok()
        };
        if !signalled {
            continue;
        }

        let redial = {
            let guard = consumer.redial.lock().unwrap();
            match &*guard {
                Some(_) => true,
                None => false,
            }
        };
        if !redial {
            break;
        }

        let attempt = {
            let guard = consumer.redial.lock().unwrap();
            (guard.as_ref().unwrap())()
        };

        match attempt.await {
            Ok(new_feed) => {
                debug!("consumer redial succeeded");
                let handle = tokio::spawn(fanout_loop(consumer.clone(), new_feed));
                consumer.tasks.lock().unwrap().fanout = Some(handle);
            }
            Err(err) => {
                warn!("consumer redial failed, marking closed: {err}");
                consumer.closed.store(true, Ordering::SeqCst);
                consumer.close_all_receivers().await;
                break;
            }
        }
    }
}
