// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

use crate::{AttributeSchema, EntityId, FlatField, SchemaField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Group(Vec<(String, String)>),
}

impl AttributeValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Group(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                    .collect(),
            ),
        }
    }
}

/// Schema-shaped attribute values without an identity, as sent on create and
/// update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    values: Vec<(String, AttributeValue)>,
}

impl Payload {
    pub fn new(values: Vec<(String, AttributeValue)>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[(String, AttributeValue)] {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        lookup(&self.values, key)
    }

    pub fn to_json(&self) -> Value {
        values_to_json(&self.values)
    }
}

/// One member of the remote collection, with attribute values held in schema
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    values: Vec<(String, AttributeValue)>,
}

impl Entity {
    /// Decodes a JSON object against `schema`.
    ///
    /// Attributes the schema does not name are ignored. Numbers and booleans
    /// keep their JSON text, `null` and missing plain attributes read as
    /// empty, and a missing group contributes nothing.
    pub fn from_json(schema: &AttributeSchema, json: &Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| anyhow!("expected a JSON object for {}", schema.entity_name()))?;

        let id = match object.get(schema.id_key()).map(scalar_text) {
            Some(Some(id)) if !id.is_empty() => EntityId::new(id),
            _ => bail!(
                "{} is missing identity attribute {:?}",
                schema.entity_name(),
                schema.id_key()
            ),
        };

        let mut values = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            match field {
                SchemaField::Attribute(attribute) => {
                    let text = match object.get(&attribute.key) {
                        None => String::new(),
                        Some(value) => scalar_text(value).ok_or_else(|| {
                            anyhow!(
                                "attribute {:?} of {} {id} must be a scalar value",
                                attribute.key,
                                schema.entity_name()
                            )
                        })?,
                    };
                    values.push((attribute.key.clone(), AttributeValue::Text(text)));
                }
                SchemaField::Group { key, entries } => {
                    let Some(raw) = object.get(key) else {
                        continue;
                    };
                    if raw.is_null() {
                        continue;
                    }
                    let group = raw.as_object().ok_or_else(|| {
                        anyhow!(
                            "group {key:?} of {} {id} must be a JSON object",
                            schema.entity_name()
                        )
                    })?;
                    let mut members = Vec::with_capacity(entries.len());
                    for entry in entries {
                        let text = match group.get(&entry.key) {
                            None => String::new(),
                            Some(value) => scalar_text(value).ok_or_else(|| {
                                anyhow!(
                                    "entry {:?} in group {key:?} of {} {id} must be a scalar value",
                                    entry.key,
                                    schema.entity_name()
                                )
                            })?,
                        };
                        members.push((entry.key.clone(), text));
                    }
                    values.push((key.clone(), AttributeValue::Group(members)));
                }
            }
        }

        Ok(Self { id, values })
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn values(&self) -> &[(String, AttributeValue)] {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        lookup(&self.values, key)
    }

    /// `(key, value)` pairs in declaration order with the group inlined.
    pub fn flatten(&self) -> impl Iterator<Item = FlatField<'_>> + '_ {
        flatten_values(&self.values)
    }

    pub fn flat_value(&self, flat_key: &str) -> Option<&str> {
        self.flatten()
            .find(|field| field.key == flat_key)
            .map(|field| field.value)
    }

    /// The same attributes as a payload, identity removed.
    pub fn to_payload(&self, schema: &AttributeSchema) -> Payload {
        Payload::new(
            self.values
                .iter()
                .filter(|(key, _)| key != schema.id_key())
                .cloned()
                .collect(),
        )
    }
}

fn lookup<'a>(values: &'a [(String, AttributeValue)], key: &str) -> Option<&'a AttributeValue> {
    values
        .iter()
        .find(|(candidate, _)| candidate == key)
        .map(|(_, value)| value)
}

fn flatten_values(values: &[(String, AttributeValue)]) -> impl Iterator<Item = FlatField<'_>> + '_ {
    values.iter().flat_map(|(key, value)| {
        let (single, group) = match value {
            AttributeValue::Text(text) => (Some(FlatField::new(key, text)), None),
            AttributeValue::Group(entries) => (
                None,
                Some(
                    entries
                        .iter()
                        .map(|(entry, text)| FlatField::new(entry, text)),
                ),
            ),
        };
        single.into_iter().chain(group.into_iter().flatten())
    })
}

fn values_to_json(values: &[(String, AttributeValue)]) -> Value {
    let object: Map<String, Value> = values
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();
    Value::Object(object)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
