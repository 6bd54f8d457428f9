// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Entity, EntityId, FieldOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowActionKind {
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAction {
    pub kind: RowActionKind,
    pub id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: EntityId,
    pub cells: Vec<String>,
}

impl ListRow {
    pub fn update_action(&self) -> RowAction {
        RowAction {
            kind: RowActionKind::Update,
            id: self.id.clone(),
        }
    }

    pub fn delete_action(&self) -> RowAction {
        RowAction {
            kind: RowActionKind::Delete,
            id: self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    headers: Vec<HeaderCell>,
    rows: Vec<ListRow>,
}

impl ListView {
    /// Builds headers and rows from one shared column layout.
    pub fn build(layout: &FieldOrder, entities: &[Entity]) -> Self {
        let headers = layout
            .columns()
            .iter()
            .map(|column| HeaderCell {
                key: column.key.clone(),
                label: column.label.clone(),
            })
            .collect();
        let rows = entities
            .iter()
            .map(|entity| ListRow {
                id: entity.id().clone(),
                cells: layout
                    .arrange(entity.flatten())
                    .into_iter()
                    .map(|cell| cell.unwrap_or_default().to_owned())
                    .collect(),
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[HeaderCell] {
        &self.headers
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn row(&self, id: &EntityId) -> Option<&ListRow> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn render_text(&self) -> String {
        let labels: Vec<String> = self
            .headers
            .iter()
            .map(|header| header.label.clone())
            .collect();
        let cells: Vec<Vec<String>> = self.rows.iter().map(|row| row.cells.clone()).collect();
        format_table(&labels, &cells)
    }
}

pub fn format_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "(no rows)\n".to_owned();
    }

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::{ListView, RowActionKind, format_table};
    use crate::{Entity, EntityId, FieldOrder, product_schema};
    use serde_json::json;

    fn entities() -> Vec<Entity> {
        let schema = product_schema();
        [
            json!({"id": "7", "name": "Widget", "description": "A widget", "prices": {"USD": "9.99", "GBP": "7.50"}}),
            json!({"description": "Big lamp", "prices": {"GBP": "20", "USD": "25"}, "name": "Lamp", "id": "8"}),
        ]
        .iter()
        .map(|value| Entity::from_json(&schema, value).expect("decode entity"))
        .collect()
    }

    #[test]
    fn headers_follow_field_order_and_show_labels() {
        let schema = product_schema();
        let view = ListView::build(&FieldOrder::for_schema(&schema), &entities());
        let headers: Vec<(&str, &str)> = view
            .headers()
            .iter()
            .map(|header| (header.key.as_str(), header.label.as_str()))
            .collect();
        assert_eq!(
            headers,
            vec![
                ("id", "Identifier"),
                ("name", "Product Name"),
                ("USD", "Price in USD"),
                ("GBP", "Price in GBP"),
                ("description", "Product Description"),
            ]
        );
    }

    #[test]
    fn every_cell_lines_up_with_its_header() {
        let schema = product_schema();
        let entities = entities();
        let view = ListView::build(&FieldOrder::for_schema(&schema), &entities);

        assert_eq!(view.rows().len(), 2);
        for (row, entity) in view.rows().iter().zip(&entities) {
            assert_eq!(&row.id, entity.id());
            assert_eq!(row.cells.len(), view.headers().len());
            for (header, cell) in view.headers().iter().zip(&row.cells) {
                assert_eq!(entity.flat_value(&header.key), Some(cell.as_str()));
            }
        }
        assert_eq!(view.rows()[1].cells, vec!["8", "Lamp", "25", "20", "Big lamp"]);
    }

    #[test]
    fn rows_expose_update_and_delete_triggers() {
        let schema = product_schema();
        let view = ListView::build(&FieldOrder::for_schema(&schema), &entities());
        let row = view.row(&EntityId::from("8")).expect("row for lamp");
        assert_eq!(row.update_action().kind, RowActionKind::Update);
        assert_eq!(row.delete_action().kind, RowActionKind::Delete);
        assert_eq!(row.delete_action().id, EntityId::from("8"));
    }

    #[test]
    fn empty_collection_renders_placeholder() {
        let schema = product_schema();
        let view = ListView::build(&FieldOrder::for_schema(&schema), &[]);
        assert_eq!(view.headers().len(), 5);
        assert_eq!(view.render_text(), "(no rows)\n");
    }

    #[test]
    fn format_table_pads_columns() {
        let rendered = format_table(
            &["id".to_owned(), "name".to_owned()],
            &[vec!["7".to_owned(), "Widget".to_owned()]],
        );
        assert_eq!(rendered, "id | name\n7  | Widget\n");
    }
}
