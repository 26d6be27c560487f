use std::fmt::{Display, Formatter, Result};

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FormSubmission,
    OrderPaid,
    CheckoutError,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FormSubmission => "form",
            EventKind::OrderPaid => "order",
            EventKind::CheckoutError => "error",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one logical order/error event inside the dedup store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub kind: EventKind,
    pub transaction_id: String,
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}_logged_{}", self.kind, self.transaction_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub form_name: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub name: String,
    pub qty: i64,
    pub price: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPayload {
    pub transaction_id: String,
    pub payment_method: String,
    pub billing: ContactInfo,
    pub shipping: ContactInfo,
    pub products: Vec<CartItem>,
    pub additional_info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutErrorPayload {
    pub order: OrderPayload,
    pub error_message: String,
    pub debug_message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    FormSubmission(FormSubmission),
    OrderPaid(OrderPayload),
    CheckoutError(CheckoutErrorPayload),
}

impl InboundEvent {
    pub fn form_submission(body: &Value) -> Self {
        let data = body
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let form_name = match body.get("form_name") {
            Some(name) if !name.is_null() => text(Some(name)),
            _ => "Unknown Form".to_string(),
        };

        InboundEvent::FormSubmission(FormSubmission { form_name, data })
    }

    pub fn order_paid(body: &Value) -> Self {
        InboundEvent::OrderPaid(OrderPayload::from_value(body))
    }

    pub fn checkout_error(body: &Value) -> Self {
        InboundEvent::CheckoutError(CheckoutErrorPayload {
            order: OrderPayload::from_value(body),
            error_message: text_or(body.get("errorMessage"), "Unknown error"),
            debug_message: text_or(body.get("debugMessage"), "Unknown debug"),
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::FormSubmission(_) => EventKind::FormSubmission,
            InboundEvent::OrderPaid(_) => EventKind::OrderPaid,
            InboundEvent::CheckoutError(_) => EventKind::CheckoutError,
        }
    }

    /// Form submissions have no stable identifier and are never deduplicated.
    pub fn dedup_key(&self) -> Option<DedupKey> {
        let order = match self {
            InboundEvent::FormSubmission(_) => return None,
            InboundEvent::OrderPaid(order) => order,
            InboundEvent::CheckoutError(error) => &error.order,
        };

        Some(DedupKey {
            kind: self.kind(),
            transaction_id: crate::utils::sanitize_text(&order.transaction_id),
        })
    }
}

impl OrderPayload {
    pub fn from_value(body: &Value) -> Self {
        let input = body.get("input");
        let field = |name: &str| input.and_then(|i| i.get(name));

        let products = body
            .get("cart")
            .and_then(|cart| cart.get("products"))
            .and_then(Value::as_array)
            .map(|items| items.iter().map(CartItem::from_value).collect())
            .unwrap_or_default();

        Self {
            transaction_id: text(field("transactionId")),
            payment_method: text(field("paymentMethod")),
            billing: ContactInfo::from_value(field("billing")),
            shipping: ContactInfo::from_value(field("shipping")),
            products,
            additional_info: text(body.get("additionalInfo")),
        }
    }
}

impl ContactInfo {
    fn from_value(value: Option<&Value>) -> Self {
        let field = |name: &str| text(value.and_then(|v| v.get(name)));

        Self {
            first_name: field("firstName"),
            last_name: field("lastName"),
            address1: field("address1"),
            city: field("city"),
            country: field("country"),
            email: field("email"),
            phone: field("phone"),
        }
    }
}

impl CartItem {
    fn from_value(value: &Value) -> Self {
        Self {
            name: text(value.get("name")),
            qty: integer(value.get("qty")),
            price: text(value.get("price")),
        }
    }
}

/// Renders a loosely typed JSON value as text. Missing and null become empty.
pub fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(v) => text(Some(v)),
    }
}

/// Integer coercion: numbers are truncated, strings are read up to the first
/// non-digit, anything else is zero.
pub fn integer(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => leading_integer(s.trim()),
        Some(Value::Bool(true)) => 1,
        _ => 0,
    }
}

fn leading_integer(s: &str) -> i64 {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
