// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use crate::AttributeSchema;

/// A flattened `(key, value)` pair.
///
/// Flattening a schema yields labels; flattening an entity yields values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatField<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl<'a> FlatField<'a> {
    pub const fn new(key: &'a str, value: &'a str) -> Self {
        Self { key, value }
    }
}

/// Sorts flattened fields by ascending key length, keeping encounter order
/// for keys of equal length.
pub fn order<'a, I>(fields: I) -> Vec<FlatField<'a>>
where
    I: IntoIterator<Item = FlatField<'a>>,
{
    let mut ordered: Vec<FlatField<'a>> = fields.into_iter().collect();
    ordered.sort_by_key(|field| field.key.chars().count());
    ordered
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

/// Column layout for one render pass.
///
/// Computed once from the schema and shared by the header builder, the row
/// builder and the form builder, so a cell at position `i` always belongs to
/// the header at position `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOrder {
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
}

impl FieldOrder {
    pub fn for_schema(schema: &AttributeSchema) -> Self {
        let columns: Vec<Column> = order(schema.flatten())
            .into_iter()
            .map(|field| Column {
                key: field.key.to_owned(),
                label: field.value.to_owned(),
            })
            .collect();
        let positions = columns
            .iter()
            .enumerate()
            .map(|(position, column)| (column.key.clone(), position))
            .collect();
        Self { columns, positions }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Places flattened values into their column slots.
    ///
    /// Keys the layout does not know are dropped; columns the input does not
    /// cover stay `None`.
    pub fn arrange<'a, I>(&self, fields: I) -> Vec<Option<&'a str>>
    where
        I: IntoIterator<Item = FlatField<'a>>,
    {
        let mut slots = vec![None; self.columns.len()];
        for field in fields {
            if let Some(position) = self.position(field.key)
                && let Some(slot) = slots.get_mut(position)
            {
                *slot = Some(field.value);
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldOrder, FlatField, order};
    use crate::product_schema;

    #[test]
    fn order_sorts_by_key_length_with_stable_ties() {
        let schema = product_schema();
        let keys: Vec<&str> = order(schema.flatten())
            .into_iter()
            .map(|field| field.key)
            .collect();
        assert_eq!(keys, vec!["id", "name", "USD", "GBP", "description"]);
    }

    #[test]
    fn order_keeps_encounter_order_for_equal_lengths() {
        let fields = vec![
            FlatField::new("bbb", "1"),
            FlatField::new("aaa", "2"),
            FlatField::new("c", "3"),
            FlatField::new("ccc", "4"),
        ];
        let keys: Vec<&str> = order(fields).into_iter().map(|field| field.key).collect();
        assert_eq!(keys, vec!["c", "bbb", "aaa", "ccc"]);
    }

    #[test]
    fn field_order_exposes_positions_and_labels() {
        let layout = FieldOrder::for_schema(&product_schema());
        assert_eq!(layout.len(), 5);
        assert_eq!(layout.position("id"), Some(0));
        assert_eq!(layout.position("GBP"), Some(3));
        assert_eq!(layout.position("prices"), None);
        assert_eq!(layout.columns()[4].label, "Product Description");
    }

    #[test]
    fn arrange_slots_values_by_shared_position() {
        let layout = FieldOrder::for_schema(&product_schema());
        let values = vec![
            FlatField::new("description", "A widget"),
            FlatField::new("GBP", "7.50"),
            FlatField::new("id", "7"),
            FlatField::new("unknown", "dropped"),
        ];
        let slots = layout.arrange(values);
        assert_eq!(
            slots,
            vec![Some("7"), None, None, Some("7.50"), Some("A widget")]
        );
    }
}
