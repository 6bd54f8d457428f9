// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::HashSet;

use crate::FlatField;

pub const DEFAULT_ID_KEY: &str = "id";
pub const DEFAULT_ENTITY_NAME: &str = "product";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub label: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// One top-level entry of an [`AttributeSchema`].
///
/// A `Group` nests exactly one level of plain attributes under its key; the
/// group itself never becomes a field, only its entries do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaField {
    Attribute(Attribute),
    Group { key: String, entries: Vec<Attribute> },
}

impl SchemaField {
    pub fn attribute(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Attribute(Attribute::new(key, label))
    }

    pub fn group(key: impl Into<String>, entries: Vec<Attribute>) -> Self {
        Self::Group {
            key: key.into(),
            entries,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Attribute(attribute) => &attribute.key,
            Self::Group { key, .. } => key,
        }
    }
}

/// Declarative description of the entities in a collection.
///
/// Fixed after construction. `new` rejects schemas with more than one group,
/// without a plain identity attribute, or with colliding flattened keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSchema {
    entity_name: String,
    id_key: String,
    fields: Vec<SchemaField>,
}

impl AttributeSchema {
    pub fn new(
        entity_name: impl Into<String>,
        id_key: impl Into<String>,
        fields: Vec<SchemaField>,
    ) -> Result<Self> {
        let schema = Self {
            entity_name: entity_name.into(),
            id_key: id_key.into(),
            fields,
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.entity_name.trim().is_empty() {
            bail!("schema entity name must not be empty");
        }

        let groups = self
            .fields
            .iter()
            .filter(|field| matches!(field, SchemaField::Group { .. }))
            .count();
        if groups > 1 {
            bail!("schema declares {groups} groups; at most one nested group is supported");
        }

        match self.fields.iter().find(|field| field.key() == self.id_key) {
            Some(SchemaField::Attribute(_)) => {}
            Some(SchemaField::Group { .. }) => {
                bail!("identity attribute {:?} cannot be a group", self.id_key)
            }
            None => bail!(
                "schema has no identity attribute {:?} -- add it to the attribute list",
                self.id_key
            ),
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if let SchemaField::Group { key, .. } = field
                && key.trim().is_empty()
            {
                bail!("schema group key must not be empty");
            }
        }
        for flat in self.flatten() {
            if flat.key.trim().is_empty() {
                bail!("schema attribute keys must not be empty");
            }
            if !seen.insert(flat.key) {
                bail!(
                    "schema key {:?} appears more than once; group entries share the attribute namespace",
                    flat.key
                );
            }
        }

        Ok(())
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn id_key(&self) -> &str {
        &self.id_key
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Key and entries of the nested group, when the schema has one.
    pub fn group(&self) -> Option<(&str, &[Attribute])> {
        self.fields.iter().find_map(|field| match field {
            SchemaField::Group { key, entries } => Some((key.as_str(), entries.as_slice())),
            SchemaField::Attribute(_) => None,
        })
    }

    /// `(key, label)` pairs in declaration order with the group inlined.
    pub fn flatten(&self) -> impl Iterator<Item = FlatField<'_>> + '_ {
        self.fields.iter().flat_map(|field| {
            let (single, group) = match field {
                SchemaField::Attribute(attribute) => {
                    (Some(FlatField::new(&attribute.key, &attribute.label)), None)
                }
                SchemaField::Group { entries, .. } => (
                    None,
                    Some(
                        entries
                            .iter()
                            .map(|entry| FlatField::new(&entry.key, &entry.label)),
                    ),
                ),
            };
            single.into_iter().chain(group.into_iter().flatten())
        })
    }

    pub fn label(&self, flat_key: &str) -> Option<&str> {
        self.flatten()
            .find(|field| field.key == flat_key)
            .map(|field| field.value)
    }
}

/// The product catalog schema served by the store backend.
pub fn product_schema() -> AttributeSchema {
    AttributeSchema {
        entity_name: DEFAULT_ENTITY_NAME.to_owned(),
        id_key: DEFAULT_ID_KEY.to_owned(),
        fields: vec![
            SchemaField::attribute("id", "Identifier"),
            SchemaField::attribute("name", "Product Name"),
            SchemaField::attribute("description", "Product Description"),
            SchemaField::group(
                "prices",
                vec![
                    Attribute::new("USD", "Price in USD"),
                    Attribute::new("GBP", "Price in GBP"),
                ],
            ),
        ],
    }
}
