//! AMQP topic-exchange publisher (component E, server-side).
//!
//! Ported from `original_source/internal/rabbitmq/message_broker.go`'s
//! `pushMsg(ctx, routingKey, val)` shape, implemented against `lapin` (the
//! AMQP crate the broker/consumer-shaped `other_examples` files converge
//! on) since the teacher has no broker dependency to generalize from.

use async_trait::async_trait;
use chrono::Utc;
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, ExchangeKind};
use relation_core::MessageBroker;
use relation_domain::{ErrorCode, Friendship, Person, RelationError};

const EXCHANGE: &str = "relationer";
const APP_ID: &str = "relationer-server";

pub struct AmqpBroker {
    channel: Channel,
}

impl AmqpBroker {
    /// Declares the durable, non-auto-deleted topic exchange if it doesn't
    /// already exist, then wraps the channel for publishing.
    pub async fn connect(channel: Channel) -> Result<Self, RelationError> {
        channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions { durable: true, auto_delete: false, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "exchange.Declare"))?;
        Ok(AmqpBroker { channel })
    }

    async fn push_msg(
        &self,
        routing_key: &str,
        value: &impl serde::Serialize,
    ) -> Result<(), RelationError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "json.Marshal"))?;

        let props = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_content_encoding("application/json".into())
            .with_kind(routing_key.into())
            .with_timestamp(Utc::now().timestamp() as u64)
            .with_app_id(APP_ID.into());

        self.channel
            .basic_publish(
                EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                props,
            )
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "channel.Publish"))?
            .await
            .map_err(|e| RelationError::wrap(e, ErrorCode::Internal, "channel.Publish confirm"))?;
        Ok(())
    }
}

#[async_trait]
impl MessageBroker for AmqpBroker {
    async fn created_person(&self, person: &Person) -> Result<(), RelationError> {
        self.push_msg("person.created", person).await
    }

    async fn created_friendship(&self, friendship: &Friendship) -> Result<(), RelationError> {
        self.push_msg("friendship.created", friendship).await
    }

    async fn deleted_person(&self, id: i64) -> Result<(), RelationError> {
        self.push_msg("person.deleted", &serde_json::json!({ "id": id })).await
    }
}
