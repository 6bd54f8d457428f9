// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{AttributeSchema, Entity, EntityForm, EntityId, FieldOrder, ListView, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the remote collection resource.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub status: u16,
    pub body: String,
}

impl RemoteReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes remote calls on behalf of the [`SyncController`].
///
/// `Err` means the call never produced a response (unreachable host,
/// timeout). Non-success statuses come back as `Ok` replies.
pub trait Transport {
    fn send(&mut self, call: &RemoteCall) -> Result<RemoteReply>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, call: &RemoteCall) -> Result<RemoteReply> {
        (**self).send(call)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "fieldErrors")]
    field_errors: Vec<FieldError>,
}

/// User-facing report of a failed remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub method: Method,
    pub lines: Vec<String>,
}

impl Notification {
    pub fn from_reply(method: Method, reply: &RemoteReply) -> Self {
        match serde_json::from_str::<ErrorBody>(&reply.body) {
            Ok(body) if !body.field_errors.is_empty() => Self {
                method,
                lines: body
                    .field_errors
                    .iter()
                    .map(|error| format!("Field: {} - {}", error.field, error.message))
                    .collect(),
            },
            _ => Self::failure(method, format!("server returned {}", reply.status)),
        }
    }

    pub fn failure(method: Method, detail: impl fmt::Display) -> Self {
        Self {
            method,
            lines: vec![format!("request failed: {detail}")],
        }
    }

    pub fn report(&self) -> String {
        let mut out = format!("{} Errors:\n", self.method);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report().trim_end())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Remote(Notification),
    /// The collection reply arrived but did not decode under the schema.
    #[error("{0}")]
    Decode(Notification),
    #[error("no {entity} with id {id} in the current collection -- run `list` to refresh")]
    UnknownEntity { entity: String, id: EntityId },
}

impl SyncError {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Remote(notification) | Self::Decode(notification) => Some(notification),
            Self::UnknownEntity { .. } => None,
        }
    }
}

/// A mutation emitted by a form submission or a row trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    Create(Payload),
    Update { target: Entity, payload: Payload },
    Delete(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Mutated { method: Method, id: Option<EntityId> },
    Refreshed { revision: u64, count: usize },
}

/// Authoritative list of entities, only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityCollection {
    entities: Vec<Entity>,
    revision: u64,
}

impl EntityCollection {
    fn replace(&mut self, entities: Vec<Entity>) {
        self.entities = entities;
        self.revision += 1;
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    /// Number of completed refreshes; zero before the first `list()`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Owns the entity collection and keeps it in step with the remote resource.
///
/// Every successful create, update or delete is followed by a full `list()`;
/// nothing is patched locally. A failed call leaves the collection as it was.
pub struct SyncController<T> {
    schema: AttributeSchema,
    collection_path: String,
    transport: T,
    collection: EntityCollection,
}

impl<T: Transport> SyncController<T> {
    pub fn new(schema: AttributeSchema, collection_path: &str, transport: T) -> Self {
        Self {
            schema,
            collection_path: collection_path.to_owned(),
            transport,
            collection: EntityCollection::default(),
        }
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn collection(&self) -> &EntityCollection {
        &self.collection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn layout(&self) -> FieldOrder {
        FieldOrder::for_schema(&self.schema)
    }

    pub fn list_view(&self) -> ListView {
        ListView::build(&self.layout(), self.collection.entities())
    }

    pub fn create_form(&self) -> EntityForm {
        EntityForm::create(&self.schema, &self.layout())
    }

    pub fn update_form(&self, id: &EntityId) -> Result<EntityForm, SyncError> {
        let target = self.require(id)?;
        Ok(EntityForm::update(&self.schema, &self.layout(), target))
    }

    pub fn list(&mut self) -> Result<Vec<SyncEvent>, SyncError> {
        let call = RemoteCall {
            method: Method::Get,
            path: self.collection_path.clone(),
            body: None,
        };
        let reply = self.send(&call)?;
        let entities = decode_collection(&self.schema, &reply.body).map_err(|error| {
            warn!(path = %call.path, error = %format!("{error:#}"), "collection body rejected");
            SyncError::Decode(Notification::failure(
                Method::Get,
                format!("decode collection: {error:#}"),
            ))
        })?;

        self.collection.replace(entities);
        let revision = self.collection.revision();
        let count = self.collection.len();
        info!(revision, count, "collection refreshed");
        Ok(vec![SyncEvent::Refreshed { revision, count }])
    }

    pub fn create(&mut self, payload: &Payload) -> Result<Vec<SyncEvent>, SyncError> {
        let call = RemoteCall {
            method: Method::Post,
            path: self.collection_path.clone(),
            body: Some(payload.to_json()),
        };
        self.mutate(&call, None)
    }

    pub fn update(
        &mut self,
        target: &Entity,
        payload: &Payload,
    ) -> Result<Vec<SyncEvent>, SyncError> {
        let call = RemoteCall {
            method: Method::Put,
            path: self.member_path(target.id()),
            body: Some(payload.to_json()),
        };
        self.mutate(&call, Some(target.id().clone()))
    }

    pub fn delete(&mut self, id: &EntityId) -> Result<Vec<SyncEvent>, SyncError> {
        self.require(id)?;
        let call = RemoteCall {
            method: Method::Delete,
            path: self.member_path(id),
            body: None,
        };
        self.mutate(&call, Some(id.clone()))
    }

    pub fn apply(&mut self, request: &SyncRequest) -> Result<Vec<SyncEvent>, SyncError> {
        match request {
            SyncRequest::Create(payload) => self.create(payload),
            SyncRequest::Update { target, payload } => self.update(target, payload),
            SyncRequest::Delete(id) => self.delete(id),
        }
    }

    fn require(&self, id: &EntityId) -> Result<&Entity, SyncError> {
        self.collection
            .get(id)
            .ok_or_else(|| SyncError::UnknownEntity {
                entity: self.schema.entity_name().to_owned(),
                id: id.clone(),
            })
    }

    fn member_path(&self, id: &EntityId) -> String {
        format!("{}/{}", self.collection_path.trim_end_matches('/'), id)
    }

    fn mutate(
        &mut self,
        call: &RemoteCall,
        id: Option<EntityId>,
    ) -> Result<Vec<SyncEvent>, SyncError> {
        self.send(call)?;
        let mut events = vec![SyncEvent::Mutated {
            method: call.method,
            id,
        }];
        events.extend(self.list()?);
        Ok(events)
    }

    fn send(&mut self, call: &RemoteCall) -> Result<RemoteReply, SyncError> {
        debug!(method = %call.method, path = %call.path, "sending request");
        let reply = self.transport.send(call).map_err(|error| {
            warn!(method = %call.method, path = %call.path, error = %format!("{error:#}"), "request failed");
            SyncError::Remote(Notification::failure(call.method, format!("{error:#}")))
        })?;

        if !reply.is_success() {
            warn!(method = %call.method, path = %call.path, status = reply.status, "request rejected");
            return Err(SyncError::Remote(Notification::from_reply(
                call.method,
                &reply,
            )));
        }

        debug!(method = %call.method, status = reply.status, "request succeeded");
        Ok(reply)
    }
}

/// Accepts a bare JSON array or a HAL envelope whose `_embedded` object holds
/// the array.
fn decode_collection(schema: &AttributeSchema, body: &str) -> Result<Vec<Entity>> {
    let value: Value = serde_json::from_str(body)?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(object) => object
            .get("_embedded")
            .and_then(Value::as_object)
            .and_then(|embedded| embedded.values().find_map(Value::as_array))
            .ok_or_else(|| anyhow!("expected a JSON array or a HAL `_embedded` collection"))?,
        _ => return Err(anyhow!("expected a JSON array of {}s", schema.entity_name())),
    };
    items
        .iter()
        .map(|item| Entity::from_json(schema, item))
        .collect()
}
