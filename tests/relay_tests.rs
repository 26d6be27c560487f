use std::{sync::Arc, time::Duration};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use storefront_relay::{
    clients::{
        discord::DiscordClient,
        store::{ExpiringSet, InMemoryExpiringSet},
    },
    models::{
        embed::{EMBED_COLOR, WebhookEnvelope},
        event::InboundEvent,
        status::DeliveryResult,
    },
    relay::EventRelay,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const TTL: Duration = Duration::from_secs(12 * 60 * 60);

fn relay_with_ttl(server: &MockServer, ttl: Duration) -> EventRelay {
    EventRelay::new(
        Arc::new(InMemoryExpiringSet::new()),
        DiscordClient::with_webhook(Some(format!("{}/webhook", server.uri()))),
        ttl,
        false,
    )
}

fn relay_for(server: &MockServer) -> EventRelay {
    relay_with_ttl(server, TTL)
}

async fn mount_webhook(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn delivered(server: &MockServer) -> Vec<WebhookEnvelope> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.body_json::<WebhookEnvelope>().unwrap())
        .collect()
}

fn order_body(transaction_id: &str) -> Value {
    json!({
        "input": {
            "transactionId": transaction_id,
            "paymentMethod": "card",
            "billing": {
                "firstName": "Jane",
                "lastName": "Doe",
                "address1": "1 Main St",
                "city": "Springfield",
                "country": "US",
                "email": "jane@example.com",
                "phone": "555-0100"
            },
            "shipping": {
                "firstName": "Jane",
                "lastName": "Doe",
                "address1": "1 Main St",
                "city": "Springfield",
                "country": "US",
                "phone": "555-0100"
            }
        },
        "cart": {
            "products": [{ "name": "Lion's Mane", "qty": 2, "price": "19.99" }]
        },
        "additionalInfo": "Leave at the door"
    })
}

fn field_names(envelope: &WebhookEnvelope) -> Vec<String> {
    envelope.embeds[0]
        .fields
        .iter()
        .map(|f| f.name.clone())
        .collect()
}

/// Test: A paid order is relayed once and the repeat is suppressed
#[tokio::test]
async fn test_order_paid_is_relayed_once() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 1).await;
    let relay = relay_for(&server);

    let body = json!({
        "input": { "paymentMethod": "card", "transactionId": "TX1" },
        "cart": { "products": [] }
    });

    assert_eq!(
        relay.handle(InboundEvent::order_paid(&body)).await,
        DeliveryResult::Sent
    );
    assert_eq!(
        relay.handle(InboundEvent::order_paid(&body)).await,
        DeliveryResult::Duplicate
    );

    Ok(())
}

/// Test: Orders without a transaction id are never delivered
#[tokio::test]
async fn test_empty_transaction_id_is_treated_as_duplicate() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 0).await;
    let relay = relay_for(&server);

    for body in [order_body(""), json!({}), order_body("   ")] {
        assert_eq!(
            relay.handle(InboundEvent::order_paid(&body)).await,
            DeliveryResult::Duplicate
        );
        assert_eq!(
            relay.handle(InboundEvent::checkout_error(&body)).await,
            DeliveryResult::Duplicate
        );
    }

    Ok(())
}

/// Test: Once the TTL has elapsed a transaction is relayed again
#[tokio::test]
async fn test_transaction_is_unseen_after_ttl() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 2).await;
    let relay = relay_with_ttl(&server, Duration::from_millis(200));

    let event = InboundEvent::order_paid(&order_body("TX-TTL"));

    assert_eq!(relay.handle(event.clone()).await, DeliveryResult::Sent);
    assert_eq!(relay.handle(event.clone()).await, DeliveryResult::Duplicate);

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(relay.handle(event).await, DeliveryResult::Sent);

    Ok(())
}

/// Test: Paid order embed carries fields in the expected order
#[tokio::test]
async fn test_order_embed_layout() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 1).await;
    let relay = relay_for(&server);

    relay
        .handle(InboundEvent::order_paid(&order_body("TX-LAYOUT")))
        .await;

    let envelopes = delivered(&server).await;
    assert_eq!(envelopes.len(), 1);

    let embed = &envelopes[0].embeds[0];
    assert_eq!(embed.title, "New Order Detected");
    assert_eq!(embed.description, "Order successfully paid.");
    assert_eq!(embed.color, EMBED_COLOR);
    assert_eq!(
        field_names(&envelopes[0]),
        [
            "Payment Method",
            "Transaction ID",
            "Billing Info",
            "Shipping Info",
            "Products",
            "Additional Info"
        ]
    );
    assert!(embed.fields[0].inline && embed.fields[1].inline);
    assert_eq!(embed.fields[1].value, "TX-LAYOUT");
    assert!(embed.fields[2].value.contains("Email: jane@example.com"));
    assert!(!embed.fields[3].value.contains("Email:"));
    assert_eq!(
        embed.fields[4].value,
        "- **Lion's Mane** (Qty: 2, Price: 19.99)"
    );

    Ok(())
}

/// Test: Checkout error fields lead with the error and debug messages
#[tokio::test]
async fn test_checkout_error_prepends_messages() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 1).await;
    let relay = relay_for(&server);

    let mut body = order_body("TX-ERR");
    body["errorMessage"] = json!("Card declined");
    body["debugMessage"] = json!("<code>insufficient_funds</code>");

    assert_eq!(
        relay.handle(InboundEvent::checkout_error(&body)).await,
        DeliveryResult::Sent
    );

    let envelopes = delivered(&server).await;
    let embed = &envelopes[0].embeds[0];

    assert_eq!(embed.title, "Checkout Error Detected");
    assert_eq!(
        field_names(&envelopes[0]),
        [
            "Error Message",
            "Debug Message",
            "Payment Method",
            "Transaction ID",
            "Billing Info",
            "Shipping Info",
            "Products",
            "Additional Info"
        ]
    );
    assert!(embed.fields[0].inline && embed.fields[1].inline);
    assert_eq!(embed.fields[0].value, "Card declined");
    assert_eq!(embed.fields[1].value, "insufficient_funds");

    Ok(())
}

/// Test: Order and error events for one transaction are tracked separately
#[tokio::test]
async fn test_order_and_error_keys_do_not_collide() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 2).await;
    let relay = relay_for(&server);

    let body = order_body("TX-SHARED");

    assert_eq!(
        relay.handle(InboundEvent::checkout_error(&body)).await,
        DeliveryResult::Sent
    );
    assert_eq!(
        relay.handle(InboundEvent::order_paid(&body)).await,
        DeliveryResult::Sent
    );

    Ok(())
}

/// Test: Form submissions drop tracking fields and are never deduplicated
#[tokio::test]
async fn test_form_submission_fields() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 2).await;
    let relay = relay_for(&server);

    let body = json!({
        "form_name": "Contact <b>Us</b>",
        "data": {
            "name": "Ann",
            "user_agent": "Mozilla/5.0",
            "email": "ann@example.com",
            "referrer": "https://google.com",
            "ip": "10.0.0.1",
            "message": "Hello\nthere"
        }
    });

    assert_eq!(
        relay.handle(InboundEvent::form_submission(&body)).await,
        DeliveryResult::Sent
    );
    assert_eq!(
        relay.handle(InboundEvent::form_submission(&body)).await,
        DeliveryResult::Sent
    );

    let envelopes = delivered(&server).await;
    let embed = &envelopes[0].embeds[0];

    assert_eq!(embed.title, "Form Submission");
    assert_eq!(embed.description, "**Form Name**: Contact Us");
    assert_eq!(field_names(&envelopes[0]), ["Name", "Email", "Message"]);
    assert!(embed.fields.iter().all(|f| !f.inline));
    assert_eq!(embed.fields[2].value, "Hello there");

    Ok(())
}

/// Test: Without a webhook URL nothing is sent
#[tokio::test]
async fn test_missing_webhook_reports_not_configured() -> Result<()> {
    let relay = EventRelay::new(
        Arc::new(InMemoryExpiringSet::new()),
        DiscordClient::with_webhook(None),
        TTL,
        false,
    );

    assert_eq!(
        relay
            .handle(InboundEvent::form_submission(&json!({ "data": { "a": "b" } })))
            .await,
        DeliveryResult::NotConfigured
    );
    assert_eq!(
        relay
            .handle(InboundEvent::order_paid(&order_body("TX-NOCONF")))
            .await,
        DeliveryResult::NotConfigured
    );

    Ok(())
}

/// Test: Transport failures are reported and still count as seen
#[tokio::test]
async fn test_transport_failure_is_not_retried() -> Result<()> {
    let relay = EventRelay::new(
        Arc::new(InMemoryExpiringSet::new()),
        DiscordClient::with_webhook(Some("http://127.0.0.1:1/webhook".to_string())),
        TTL,
        true,
    );

    let event = InboundEvent::order_paid(&order_body("TX-DOWN"));

    let result = relay.handle(event.clone()).await;
    assert!(
        matches!(result, DeliveryResult::DeliveryFailed { ref reason } if !reason.is_empty()),
        "Expected delivery failure, got {:?}",
        result
    );

    assert_eq!(relay.handle(event).await, DeliveryResult::Duplicate);

    Ok(())
}

/// Test: Non-2xx webhook responses are not inspected
#[tokio::test]
async fn test_error_status_from_webhook_counts_as_sent() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let relay = relay_for(&server);

    assert_eq!(
        relay
            .handle(InboundEvent::order_paid(&order_body("TX-500")))
            .await,
        DeliveryResult::Sent
    );

    Ok(())
}

/// Test: Concurrent duplicates are delivered exactly once
#[tokio::test]
async fn test_concurrent_duplicates_deliver_once() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 1).await;
    let relay = Arc::new(relay_for(&server));

    let event = InboundEvent::order_paid(&order_body("TX-RACE"));

    let results =
        futures_util::future::join_all((0..10).map(|_| relay.handle(event.clone()))).await;

    let sent = results
        .iter()
        .filter(|r| **r == DeliveryResult::Sent)
        .count();
    let duplicates = results
        .iter()
        .filter(|r| **r == DeliveryResult::Duplicate)
        .count();

    assert_eq!(sent, 1);
    assert_eq!(duplicates, 9);

    Ok(())
}

struct UnavailableStore;

#[async_trait]
impl ExpiringSet for UnavailableStore {
    async fn set_if_absent(&self, _key: &str, _ttl: Duration) -> Result<bool, Error> {
        Err(anyhow!("connection refused"))
    }

    async fn ping(&self) -> Result<(), Error> {
        Err(anyhow!("connection refused"))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}

/// Test: Store failures drop the keyed event without delivering it
#[tokio::test]
async fn test_store_failure_skips_delivery() -> Result<()> {
    let server = MockServer::start().await;
    mount_webhook(&server, 1).await;
    let relay = EventRelay::new(
        Arc::new(UnavailableStore),
        DiscordClient::with_webhook(Some(format!("{}/webhook", server.uri()))),
        TTL,
        false,
    );

    assert_eq!(
        relay
            .handle(InboundEvent::order_paid(&order_body("TX-STORE")))
            .await,
        DeliveryResult::DeliveryFailed {
            reason: "connection refused".to_string()
        }
    );

    // Form submissions never touch the store.
    assert_eq!(
        relay
            .handle(InboundEvent::form_submission(&json!({ "data": { "a": "b" } })))
            .await,
        DeliveryResult::Sent
    );

    Ok(())
}
