// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use storefront_app::{
    AttributeSchema, EntityForm, EntityId, SyncController, Transport, format_table,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: String,
}

impl Assignment {
    fn parse(raw: &str) -> Result<Self> {
        let (key, value) = raw.split_once('=').ok_or_else(|| {
            anyhow!("expected key=value, got {raw:?}; run `storefront fields` to list the keys")
        })?;
        let key = key.trim();
        if key.is_empty() {
            bail!("assignment {raw:?} has an empty key");
        }
        Ok(Self {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Update(EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Fields(FormTarget),
    Create(Vec<Assignment>),
    Update {
        id: EntityId,
        assignments: Vec<Assignment>,
    },
    Delete(EntityId),
}

impl Command {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::List);
        };
        let rest: Vec<&str> = rest.iter().map(|arg| arg.as_ref()).collect();

        match name.as_ref() {
            "list" => {
                no_extra_args("list", &rest)?;
                Ok(Self::List)
            }
            "fields" => match rest.as_slice() {
                [] | ["create"] => Ok(Self::Fields(FormTarget::Create)),
                ["update", id] => Ok(Self::Fields(FormTarget::Update(EntityId::from(*id)))),
                ["update"] => bail!("fields update requires an id"),
                other => bail!("unexpected arguments for fields: {}", other.join(" ")),
            },
            "create" => Ok(Self::Create(parse_assignments(&rest)?)),
            "update" => {
                let (id, assignments) = rest
                    .split_first()
                    .ok_or_else(|| anyhow!("update requires an id followed by key=value pairs"))?;
                Ok(Self::Update {
                    id: EntityId::from(*id),
                    assignments: parse_assignments(assignments)?,
                })
            }
            "delete" => match rest.as_slice() {
                [id] => Ok(Self::Delete(EntityId::from(*id))),
                [] => bail!("delete requires an id"),
                other => bail!("delete takes exactly one id, got {}", other.join(" ")),
            },
            unknown => bail!(
                "unknown command {unknown:?}; expected list, fields, create, update, or delete"
            ),
        }
    }
}

fn no_extra_args(command: &str, rest: &[&str]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        bail!("{command} takes no arguments, got {}", rest.join(" "))
    }
}

fn parse_assignments(raw: &[&str]) -> Result<Vec<Assignment>> {
    raw.iter().map(|arg| Assignment::parse(arg)).collect()
}

/// Runs one command against the remote collection.
///
/// Every command starts by loading the collection, so row triggers resolve
/// against what the server currently holds.
pub struct Runtime<T> {
    sync: SyncController<T>,
}

impl<T: Transport> Runtime<T> {
    pub fn new(schema: AttributeSchema, collection_path: &str, transport: T) -> Self {
        Self {
            sync: SyncController::new(schema, collection_path, transport),
        }
    }

    pub fn sync(&self) -> &SyncController<T> {
        &self.sync
    }

    pub fn execute(&mut self, command: &Command) -> Result<String> {
        self.sync.list()?;

        match command {
            Command::List => {}
            Command::Fields(FormTarget::Create) => {
                return Ok(render_form(&self.sync.create_form(), self.sync.schema()));
            }
            Command::Fields(FormTarget::Update(id)) => {
                return Ok(render_form(&self.sync.update_form(id)?, self.sync.schema()));
            }
            Command::Create(assignments) => {
                let mut form = self.sync.create_form();
                self.submit(&mut form, assignments)?;
            }
            Command::Update { id, assignments } => {
                let mut form = self.sync.update_form(id)?;
                self.submit(&mut form, assignments)?;
            }
            Command::Delete(id) => {
                self.sync.delete(id)?;
                info!(%id, "deleted");
            }
        }

        Ok(self.sync.list_view().render_text())
    }

    fn submit(&mut self, form: &mut EntityForm, assignments: &[Assignment]) -> Result<()> {
        for assignment in assignments {
            form.set(&assignment.key, &assignment.value)?;
        }
        let submission = form.submit(self.sync.schema())?;
        let events = self.sync.apply(&submission.request)?;
        info!(events = events.len(), "form submitted");
        Ok(())
    }
}

fn render_form(form: &EntityForm, schema: &AttributeSchema) -> String {
    let columns = ["Key", "Label", "Value"].map(str::to_owned);
    let rows: Vec<Vec<String>> = form
        .fields()
        .iter()
        .map(|field| {
            let label = if field.read_only {
                format!("{} (read-only)", field.label)
            } else {
                field.label.clone()
            };
            vec![field.key.clone(), label, field.value.clone()]
        })
        .collect();
    format!("{}\n{}", form.title(schema), format_table(&columns, &rows))
}
