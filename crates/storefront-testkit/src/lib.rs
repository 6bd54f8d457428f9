// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde_json::{Value, json};
use storefront_app::{Entity, Method, RemoteCall, RemoteReply, Transport, product_schema};

pub const COLLECTION_PATH: &str = "/store/products/";

const PRODUCT_ADJECTIVES: [&str; 8] = [
    "Classic", "Compact", "Deluxe", "Rustic", "Modern", "Vintage", "Sturdy", "Folding",
];

const PRODUCT_NOUNS: [&str; 10] = [
    "Lamp", "Chair", "Kettle", "Desk", "Shelf", "Clock", "Mirror", "Stool", "Rug", "Vase",
];

const MATERIALS: [&str; 6] = ["oak", "walnut", "steel", "brass", "ceramic", "linen"];

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const REQUIRED_CURRENCIES: [&str; 2] = ["USD", "GBP"];
pub const PRICES_MESSAGE: &str =
    "Required 2 (or more) prices (values >= 0) in the required currencies: USD, and GBP.";

pub fn product_json(id: &str, name: &str, description: &str, usd: &str, gbp: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": description,
        "prices": {"USD": usd, "GBP": gbp},
    })
}

pub fn product(id: &str, name: &str, description: &str, usd: &str, gbp: &str) -> Result<Entity> {
    Entity::from_json(
        &product_schema(),
        &product_json(id, name, description, usd, gbp),
    )
}

/// Deterministic catalog used by `--demo` and by tests that need volume.
pub fn demo_products(count: usize) -> Vec<Value> {
    (0..count)
        .map(|index| {
            let adjective = PRODUCT_ADJECTIVES[index % PRODUCT_ADJECTIVES.len()];
            let noun = PRODUCT_NOUNS[(index / PRODUCT_ADJECTIVES.len()) % PRODUCT_NOUNS.len()];
            let material = MATERIALS[index % MATERIALS.len()];
            let usd_cents = 1_499 + (index * 733) % 20_000;
            let gbp_cents = usd_cents * 4 / 5;
            product_json(
                &(index + 1).to_string(),
                &format!("{adjective} {noun}"),
                &format!("{adjective} {} in {material}", noun.to_lowercase()),
                &format_price(usd_cents),
                &format_price(gbp_cents),
            )
        })
        .collect()
}

fn format_price(cents: usize) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// In-memory stand-in for the remote collection resource.
///
/// Assigns sequential ids on create, answers unknown ids with an empty 404,
/// and records every call it receives. Bodies are checked against the
/// `requiring` keys and, once `validating_products` is set, the product
/// store's rules; violations come back as a 400 `fieldErrors` body.
#[derive(Debug, Clone)]
pub struct FakeRemote {
    collection_path: String,
    items: Vec<Value>,
    next_id: u64,
    required: Vec<String>,
    product_rules: bool,
    calls: Vec<RemoteCall>,
    pending_failure: Option<RemoteReply>,
    offline: bool,
}

impl FakeRemote {
    pub fn new(collection_path: &str) -> Self {
        Self {
            collection_path: collection_path.to_owned(),
            items: Vec::new(),
            next_id: 1,
            required: Vec::new(),
            product_rules: false,
            calls: Vec::new(),
            pending_failure: None,
            offline: false,
        }
    }

    pub fn with_items(mut self, items: Vec<Value>) -> Self {
        for item in items {
            self.insert(item);
        }
        self
    }

    /// Rejects create/update bodies whose `key` is missing or blank.
    pub fn requiring(mut self, key: &str) -> Self {
        self.required.push(key.to_owned());
        self
    }

    /// Enforces the product store's rules: `name` non-empty and at most
    /// [`MAX_NAME_LENGTH`] characters, `description` at most
    /// [`MAX_DESCRIPTION_LENGTH`], and a non-negative number for every price
    /// with both [`REQUIRED_CURRENCIES`] present.
    pub fn validating_products(mut self) -> Self {
        self.product_rules = true;
        self
    }

    pub fn demo(count: usize) -> Self {
        Self::new(COLLECTION_PATH)
            .with_items(demo_products(count))
            .validating_products()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().filter_map(item_id).collect()
    }

    pub fn calls(&self) -> &[RemoteCall] {
        &self.calls
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls.iter().map(|call| call.method).collect()
    }

    /// Adds an item without going through a call, as another writer would.
    pub fn insert(&mut self, mut item: Value) {
        if let Some(object) = item.as_object_mut()
            && !object.contains_key("id")
        {
            object.insert("id".to_owned(), Value::String(self.next_id.to_string()));
        }
        if let Some(id) = item_id(&item)
            && let Ok(numeric) = id.parse::<u64>()
        {
            self.next_id = self.next_id.max(numeric + 1);
        }
        self.items.push(item);
    }

    /// Drops an item without going through a call, as another writer would.
    pub fn remove(&mut self, id: &str) -> Option<Value> {
        let index = self
            .items
            .iter()
            .position(|item| item_id(item).as_deref() == Some(id))?;
        Some(self.items.remove(index))
    }

    pub fn fail_next(&mut self, status: u16, body: &str) {
        self.pending_failure = Some(RemoteReply {
            status,
            body: body.to_owned(),
        });
    }

    pub fn reject_next(&mut self, status: u16, errors: &[(&str, &str)]) {
        let body = field_errors(errors);
        self.fail_next(status, &body.to_string());
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn route(&mut self, call: &RemoteCall) -> RemoteReply {
        let root = self.collection_path.trim_end_matches('/').to_owned();
        let path = call.path.trim_end_matches('/');
        let member = path
            .strip_prefix(root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_owned);

        match (call.method, member) {
            (Method::Get, None) if path == root => reply(200, &Value::Array(self.items.clone())),
            (Method::Post, None) if path == root => {
                let Some(mut body) = call.body.clone().filter(Value::is_object) else {
                    return reply(400, &field_errors(&[("body", "must be a JSON object")]));
                };
                if let Some(rejection) = self.validate(&body) {
                    return rejection;
                }
                if let Some(object) = body.as_object_mut() {
                    object.insert("id".to_owned(), Value::String(self.next_id.to_string()));
                }
                self.next_id += 1;
                self.items.push(body.clone());
                reply(201, &body)
            }
            (Method::Put, Some(id)) => {
                let Some(mut body) = call.body.clone().filter(Value::is_object) else {
                    return reply(400, &field_errors(&[("body", "must be a JSON object")]));
                };
                if let Some(rejection) = self.validate(&body) {
                    return rejection;
                }
                let Some(slot) = self
                    .items
                    .iter_mut()
                    .find(|item| item_id(item).as_deref() == Some(id.as_str()))
                else {
                    return not_found();
                };
                if let Some(object) = body.as_object_mut() {
                    object.insert("id".to_owned(), Value::String(id));
                }
                *slot = body.clone();
                reply(200, &body)
            }
            (Method::Delete, Some(id)) => {
                let Some(index) = self
                    .items
                    .iter()
                    .position(|item| item_id(item).as_deref() == Some(id.as_str()))
                else {
                    return not_found();
                };
                let removed = self.items.remove(index);
                reply(200, &removed)
            }
            _ => RemoteReply {
                status: 405,
                body: String::new(),
            },
        }
    }

    fn validate(&self, body: &Value) -> Option<RemoteReply> {
        let mut errors: Vec<(&str, &str)> = self
            .required
            .iter()
            .filter(|key| is_blank(body.get(key.as_str())))
            .map(|key| (key.as_str(), "may not be empty"))
            .collect();
        if self.product_rules {
            for error in product_errors(body) {
                if !errors.contains(&error) {
                    errors.push(error);
                }
            }
        }

        if errors.is_empty() {
            None
        } else {
            Some(reply(400, &field_errors(&errors)))
        }
    }
}

impl Transport for FakeRemote {
    fn send(&mut self, call: &RemoteCall) -> Result<RemoteReply> {
        self.calls.push(call.clone());
        if self.offline {
            bail!("connection refused by fake remote");
        }
        if let Some(failure) = self.pending_failure.take() {
            return Ok(failure);
        }
        Ok(self.route(call))
    }
}

fn product_errors(body: &Value) -> Vec<(&'static str, &'static str)> {
    let mut errors = Vec::new();
    let name = body.get("name");
    if is_blank(name) {
        errors.push(("name", "may not be empty"));
    } else if text_len(name) > MAX_NAME_LENGTH {
        errors.push(("name", "size must be between 0 and 100"));
    }
    if text_len(body.get("description")) > MAX_DESCRIPTION_LENGTH {
        errors.push(("description", "size must be between 0 and 500"));
    }
    if !valid_prices(body.get("prices")) {
        errors.push(("prices", PRICES_MESSAGE));
    }
    errors
}

fn is_blank(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_none_or(|text| text.trim().is_empty())
}

fn text_len(value: Option<&Value>) -> usize {
    value
        .and_then(Value::as_str)
        .map_or(0, |text| text.chars().count())
}

/// Prices may arrive as JSON numbers or numeric strings, as form values do.
fn valid_prices(prices: Option<&Value>) -> bool {
    let Some(prices) = prices.and_then(Value::as_object) else {
        return false;
    };
    REQUIRED_CURRENCIES
        .iter()
        .all(|currency| prices.contains_key(*currency))
        && prices.values().all(|price| {
            let amount = match price {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => text.trim().parse::<f64>().ok(),
                _ => None,
            };
            amount.is_some_and(|amount| amount.is_finite() && amount >= 0.0)
        })
}

fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn field_errors(errors: &[(&str, &str)]) -> Value {
    json!({
        "fieldErrors": errors
            .iter()
            .map(|(field, message)| json!({"field": field, "message": message}))
            .collect::<Vec<_>>(),
    })
}

fn not_found() -> RemoteReply {
    RemoteReply {
        status: 404,
        body: String::new(),
    }
}

fn reply(status: u16, body: &Value) -> RemoteReply {
    RemoteReply {
        status,
        body: body.to_string(),
    }
}
