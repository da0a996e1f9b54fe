//! The production `DialFn`: opens an AMQP connection, declares an
//! exclusive auto-named queue, binds the requested routing keys against the
//! `relationer` topic exchange, and forwards deliveries into an mpsc
//! channel. Ported from `original_source/client/consumer.go`'s
//! `newConsumer` wiring (`Channel.QueueDeclare("", false, false, true,
//! false, nil)` + per-key `QueueBind`).

use std::sync::Arc;

use async_trait::async_trait;
use futures_lite::StreamExt;
use lapin::options::{
    BasicConsumeOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties, ExchangeKind};
use log::{debug, warn};
use relation_domain::{ErrorCode, RelationError};
use tokio::sync::mpsc;

use crate::consumer::{BrokerConnection, DeliveryFeed};
use crate::message::Message;
use crate::pool::DialFn;

const EXCHANGE: &str = "relationer";
const DELIVERY_BUFFER: usize = 64;

struct LapinConnection {
    conn: Connection,
}

#[async_trait]
impl BrokerConnection for LapinConnection {
    async fn close(&self) {
        if let Err(err) = self.conn.close(0, "consumer shutdown").await {
            warn!("error closing amqp connection: {err}");
        }
    }
}

/// Builds a `DialFn` bound to `url`. Each invocation opens its own
/// connection so a redial never reuses a channel that might already be in
/// a broken state.
pub fn amqp_dial(url: String) -> DialFn {
    Arc::new(move |bindings: Vec<String>| {
        let url = url.clone();
        Box::pin(dial_once(url, bindings))
    })
}

async fn dial_once(
    url: String,
    bindings: Vec<String>,
) -> Result<(DeliveryFeed, Box<dyn BrokerConnection>), RelationError> {
    let conn = Connection::connect(&url, ConnectionProperties::default())
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp connect"))?;
    let channel = conn
        .create_channel()
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp create_channel"))?;

    channel
        .exchange_declare(
            EXCHANGE,
            ExchangeKind::Topic,
            ExchangeDeclareOptions { durable: true, auto_delete: false, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp exchange_declare"))?;

    let queue = channel
        .queue_declare(
            "",
            QueueDeclareOptions { durable: false, auto_delete: false, exclusive: true, ..Default::default() },
            FieldTable::default(),
        )
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp queue_declare"))?;
    let queue_name = queue.name().to_string();

    let routing_keys: Vec<&str> = if bindings.is_empty() { vec!["#"] } else { bindings.iter().map(String::as_str).collect() };
    for key in &routing_keys {
        channel
            .queue_bind(&queue_name, EXCHANGE, key, QueueBindOptions::default(), FieldTable::default())
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp queue_bind"))?;
    }

    let mut consumer = channel
        .basic_consume(
            &queue_name,
            "relationer-client",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "amqp basic_consume"))?;

    let (tx, rx) = mpsc::channel(DELIVERY_BUFFER);
    tokio::spawn(async move {
        while let Some(delivery) = consumer.next().await {
            let delivery = match delivery {
                Ok(d) => d,
                Err(err) => {
                    warn!("amqp delivery error: {err}");
                    break;
                }
            };
            let kind = delivery
                .properties
                .kind()
                .clone()
                .map(|s| s.to_string())
                .unwrap_or_else(|| delivery.routing_key.to_string());
            let msg = Message::new(kind, delivery.data.clone());
            if let Err(err) = delivery.ack(lapin::options::BasicAckOptions::default()).await {
                warn!("amqp ack failed: {err}");
            }
            if tx.send(msg).await.is_err() {
                debug!("delivery forwarder: fan-out task gone, stopping");
                break;
            }
        }
    });

    Ok((rx, Box::new(LapinConnection { conn })))
}
