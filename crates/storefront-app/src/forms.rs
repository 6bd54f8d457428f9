// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};

use crate::{AttributeSchema, AttributeValue, Entity, FieldOrder, Payload, SchemaField, SyncRequest};

/// Editable field descriptor handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub value: String,
    pub read_only: bool,
}

impl FormField {
    fn editable(key: &str, label: &str, value: &str) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            value: value.to_owned(),
            read_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update { target: Entity },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub request: SyncRequest,
    pub close_dialog: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityForm {
    mode: FormMode,
    fields: Vec<FormField>,
}

impl EntityForm {
    /// Blank editable fields for every flattened attribute except the
    /// identity, in column order.
    pub fn create(schema: &AttributeSchema, layout: &FieldOrder) -> Self {
        let fields = layout
            .columns()
            .iter()
            .filter(|column| column.key != schema.id_key())
            .map(|column| FormField::editable(&column.key, &column.label, ""))
            .collect();
        Self {
            mode: FormMode::Create,
            fields,
        }
    }

    /// Read-only identity first, then the remaining columns pre-filled from
    /// `target`.
    pub fn update(schema: &AttributeSchema, layout: &FieldOrder, target: &Entity) -> Self {
        let id_label = schema.label(schema.id_key()).unwrap_or(schema.id_key());
        let mut fields = vec![FormField {
            key: schema.id_key().to_owned(),
            label: id_label.to_owned(),
            value: target.id().as_str().to_owned(),
            read_only: true,
        }];
        fields.extend(
            layout
                .columns()
                .iter()
                .filter(|column| column.key != schema.id_key())
                .map(|column| {
                    let current = target.flat_value(&column.key).unwrap_or_default();
                    FormField::editable(&column.key, &column.label, current)
                }),
        );
        Self {
            mode: FormMode::Update {
                target: target.clone(),
            },
            fields,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn title(&self, schema: &AttributeSchema) -> String {
        match self.mode {
            FormMode::Create => format!("Create new {}", schema.entity_name()),
            FormMode::Update { .. } => format!("Update an {}", schema.entity_name()),
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(field) = self.fields.iter_mut().find(|field| field.key == key) else {
            let known: Vec<&str> = self
                .fields
                .iter()
                .filter(|field| !field.read_only)
                .map(|field| field.key.as_str())
                .collect();
            bail!(
                "form has no field {key:?} -- editable fields: {}",
                known.join(", ")
            );
        };
        if field.read_only {
            bail!("field {key:?} is read-only");
        }
        field.value = value.to_owned();
        Ok(())
    }

    pub fn clear(&mut self) {
        for field in self.fields.iter_mut().filter(|field| !field.read_only) {
            field.value.clear();
        }
    }

    /// Reads every field back, trimmed, into a schema-shaped payload.
    ///
    /// A create form is cleared afterwards. Both modes ask for the dialog to
    /// close.
    pub fn submit(&mut self, schema: &AttributeSchema) -> Result<FormSubmission> {
        let payload = self.reconstruct(schema)?;
        let request = match &self.mode {
            FormMode::Create => SyncRequest::Create(payload),
            FormMode::Update { target } => SyncRequest::Update {
                target: target.clone(),
                payload,
            },
        };
        if matches!(self.mode, FormMode::Create) {
            self.clear();
        }
        Ok(FormSubmission {
            request,
            close_dialog: true,
        })
    }

    fn reconstruct(&self, schema: &AttributeSchema) -> Result<Payload> {
        let mut values = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            match field {
                SchemaField::Attribute(attribute) if attribute.key == schema.id_key() => {}
                SchemaField::Attribute(attribute) => {
                    let text = self.read(&attribute.key)?;
                    values.push((attribute.key.clone(), AttributeValue::Text(text)));
                }
                SchemaField::Group { key, entries } => {
                    let members = entries
                        .iter()
                        .map(|entry| Ok((entry.key.clone(), self.read(&entry.key)?)))
                        .collect::<Result<Vec<_>>>()?;
                    values.push((key.clone(), AttributeValue::Group(members)));
                }
            }
        }
        Ok(Payload::new(values))
    }

    fn read(&self, key: &str) -> Result<String> {
        self.value(key)
            .map(|value| value.trim().to_owned())
            .ok_or_else(|| anyhow!("form was built without an input for {key:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityForm, FormMode};
    use crate::{
        Attribute, AttributeSchema, AttributeValue, Entity, FieldOrder, SchemaField, SyncRequest,
        product_schema,
    };
    use anyhow::Result;
    use serde_json::json;

    fn widget() -> Entity {
        Entity::from_json(
            &product_schema(),
            &json!({"id": "7", "name": "Widget", "description": "A widget", "prices": {"USD": "9.99", "GBP": "7.50"}}),
        )
        .expect("decode widget")
    }

    #[test]
    fn create_form_excludes_identity_and_follows_column_order() {
        let schema = product_schema();
        let form = EntityForm::create(&schema, &FieldOrder::for_schema(&schema));
        let keys: Vec<&str> = form.fields().iter().map(|field| field.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "USD", "GBP", "description"]);
        assert!(form.fields().iter().all(|field| field.value.is_empty()));
        assert!(form.fields().iter().all(|field| !field.read_only));
        assert_eq!(form.fields()[1].label, "Price in USD");
        assert_eq!(form.title(&schema), "Create new product");
    }

    #[test]
    fn update_form_prefills_and_locks_identity() {
        let schema = product_schema();
        let form = EntityForm::update(&schema, &FieldOrder::for_schema(&schema), &widget());
        let summary: Vec<(&str, &str, bool)> = form
            .fields()
            .iter()
            .map(|field| (field.key.as_str(), field.value.as_str(), field.read_only))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "7", true),
                ("name", "Widget", false),
                ("USD", "9.99", false),
                ("GBP", "7.50", false),
                ("description", "A widget", false),
            ]
        );
        assert_eq!(form.fields()[0].label, "Identifier");
    }

    #[test]
    fn unchanged_update_round_trips_to_entity_without_identity() -> Result<()> {
        let schema = product_schema();
        let target = widget();
        let mut form = EntityForm::update(&schema, &FieldOrder::for_schema(&schema), &target);

        let submission = form.submit(&schema)?;
        assert!(submission.close_dialog);
        assert_eq!(
            submission.request,
            SyncRequest::Update {
                target: target.clone(),
                payload: target.to_payload(&schema),
            }
        );
        Ok(())
    }

    #[test]
    fn submit_trims_and_nests_group_values() -> Result<()> {
        let schema = product_schema();
        let mut form = EntityForm::create(&schema, &FieldOrder::for_schema(&schema));
        form.set("name", "  Widget  ")?;
        form.set("description", "A widget\n")?;
        form.set("USD", " 9.99")?;
        form.set("GBP", "7.50 ")?;

        let SyncRequest::Create(payload) = form.submit(&schema)?.request else {
            panic!("create form should emit a create request");
        };
        assert_eq!(
            payload.to_json(),
            json!({"name": "Widget", "description": "A widget", "prices": {"USD": "9.99", "GBP": "7.50"}})
        );
        Ok(())
    }

    #[test]
    fn trimming_is_idempotent() -> Result<()> {
        let schema = product_schema();
        let layout = FieldOrder::for_schema(&schema);

        let mut first = EntityForm::create(&schema, &layout);
        first.set("name", "  Widget  ")?;
        let SyncRequest::Create(once) = first.submit(&schema)?.request else {
            panic!("expected create request");
        };

        let mut second = EntityForm::create(&schema, &layout);
        second.set("name", "Widget")?;
        let SyncRequest::Create(twice) = second.submit(&schema)?.request else {
            panic!("expected create request");
        };

        assert_eq!(once.get("name"), Some(&AttributeValue::Text("Widget".to_owned())));
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn create_submission_clears_every_field() -> Result<()> {
        let schema = product_schema();
        let mut form = EntityForm::create(&schema, &FieldOrder::for_schema(&schema));
        form.set("name", "Widget")?;
        form.set("USD", "9.99")?;
        form.set("GBP", "7.50")?;
        form.set("description", "A widget")?;

        form.submit(&schema)?;
        assert!(form.fields().iter().all(|field| field.value.is_empty()));
        assert_eq!(form.mode(), &FormMode::Create);
        Ok(())
    }

    #[test]
    fn update_submission_keeps_field_values() -> Result<()> {
        let schema = product_schema();
        let mut form = EntityForm::update(&schema, &FieldOrder::for_schema(&schema), &widget());
        form.set("name", "Gadget")?;
        form.submit(&schema)?;
        assert_eq!(form.value("name"), Some("Gadget"));
        assert_eq!(form.value("id"), Some("7"));
        Ok(())
    }

    #[test]
    fn set_rejects_identity_and_unknown_fields() {
        let schema = product_schema();
        let layout = FieldOrder::for_schema(&schema);

        let mut update = EntityForm::update(&schema, &layout, &widget());
        let error = update.set("id", "8").expect_err("id is read-only");
        assert!(error.to_string().contains("read-only"));

        let mut create = EntityForm::create(&schema, &layout);
        let error = create.set("id", "8").expect_err("create form has no id");
        assert!(error.to_string().contains("no field"));
        let error = create.set("prices", "1").expect_err("group key is not a field");
        assert!(error.to_string().contains("editable fields"));
    }

    #[test]
    fn reconstruct_fails_when_an_input_is_missing() {
        let schema = product_schema();
        let other = AttributeSchema::new(
            "product",
            "id",
            vec![
                SchemaField::attribute("id", "Identifier"),
                SchemaField::attribute("name", "Product Name"),
                SchemaField::group("prices", vec![Attribute::new("EUR", "Price in EUR")]),
            ],
        )
        .expect("valid schema");
        let mut form = EntityForm::create(&schema, &FieldOrder::for_schema(&schema));
        let error = form
            .submit(&other)
            .expect_err("form built for another schema should fail");
        assert!(error.to_string().contains("\"EUR\""));
    }
}
