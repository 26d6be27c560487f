use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::models::{
    embed::{EMBED_COLOR, EmbedField, NotificationMessage},
    event::{
        CartItem, CheckoutErrorPayload, ContactInfo, FormSubmission, InboundEvent, OrderPayload,
        text,
    },
};

/// Form fields that carry tracking data rather than user input.
const DROPPED_FORM_FIELDS: [&str; 3] = ["user_agent", "referrer", "ip"];

static SCRIPT_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)\s*>").expect("valid regex")
});
static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z/!?][^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strips markup and control characters and collapses whitespace to single
/// spaces.
pub fn sanitize_text(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCKS.replace_all(input, "");
    let without_tags = TAGS.replace_all(&without_scripts, "");

    let printable: String = without_tags
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    WHITESPACE.replace_all(printable.trim(), " ").into_owned()
}

/// Keeps only characters legal in an address. Anything that does not look like
/// `local@domain` afterwards becomes empty.
pub fn sanitize_email(input: &str) -> String {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-@".contains(*c))
        .collect();

    match cleaned.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
        {
            cleaned
        }
        _ => String::new(),
    }
}

/// Upper-cases the first character only.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn embed_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn build_message(event: &InboundEvent, at: DateTime<Utc>) -> NotificationMessage {
    let (title, description, fields) = match event {
        InboundEvent::FormSubmission(form) => (
            "Form Submission".to_string(),
            format!("**Form Name**: {}", sanitize_text(&form.form_name)),
            format_form_fields(form),
        ),
        InboundEvent::OrderPaid(order) => (
            "New Order Detected".to_string(),
            "Order successfully paid.".to_string(),
            format_order_fields(order),
        ),
        InboundEvent::CheckoutError(error) => (
            "Checkout Error Detected".to_string(),
            "A checkout error occurred.".to_string(),
            format_error_fields(error),
        ),
    };

    NotificationMessage {
        title: sanitize_text(&title),
        description: sanitize_text(&description),
        fields,
        color: EMBED_COLOR,
        timestamp: embed_timestamp(at),
    }
}

pub fn format_form_fields(form: &FormSubmission) -> Vec<EmbedField> {
    form.data
        .iter()
        .filter(|(key, _)| !DROPPED_FORM_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| EmbedField::new(capitalize(key), sanitize_text(&text(Some(value)))))
        .collect()
}

pub fn format_order_fields(order: &OrderPayload) -> Vec<EmbedField> {
    let mut fields = vec![
        EmbedField::new("Payment Method", sanitize_text(&order.payment_method)).inline(),
        EmbedField::new("Transaction ID", sanitize_text(&order.transaction_id)).inline(),
        EmbedField::new("Billing Info", format_contact_info(&order.billing, true)),
        EmbedField::new("Shipping Info", format_contact_info(&order.shipping, false)),
    ];

    if !order.products.is_empty() {
        fields.push(EmbedField::new(
            "Products",
            format_product_details(&order.products),
        ));
    }

    let additional_info = sanitize_text(&order.additional_info);
    if !additional_info.is_empty() {
        fields.push(EmbedField::new("Additional Info", additional_info));
    }

    fields
}

pub fn format_error_fields(error: &CheckoutErrorPayload) -> Vec<EmbedField> {
    let mut fields = vec![
        EmbedField::new("Error Message", sanitize_text(&error.error_message)).inline(),
        EmbedField::new("Debug Message", sanitize_text(&error.debug_message)).inline(),
    ];
    fields.extend(format_order_fields(&error.order));
    fields
}

/// Multi-line name/address block. Billing blocks carry an e-mail line.
pub fn format_contact_info(info: &ContactInfo, with_email: bool) -> String {
    let email_line = if with_email {
        format!("Email: {}\n", sanitize_email(&info.email))
    } else {
        String::new()
    };

    format!(
        "Name: {} {}\nAddress: {}, {}, {}\n{}Phone: {}",
        sanitize_text(&info.first_name),
        sanitize_text(&info.last_name),
        sanitize_text(&info.address1),
        sanitize_text(&info.city),
        sanitize_text(&info.country),
        email_line,
        sanitize_text(&info.phone),
    )
    .trim()
    .to_string()
}

pub fn format_product_details(products: &[CartItem]) -> String {
    products
        .iter()
        .map(|product| {
            format!(
                "- **{}** (Qty: {}, Price: {})",
                sanitize_text(&product.name),
                product.qty,
                sanitize_text(&product.price),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
