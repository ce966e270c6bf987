//! Multi-row UPDATE with one statement.
//!
//! Every row is a [`Record`] whose first column is the reference (key) column.
//! The remaining columns of the first row are the update columns:
//!
//! ```text
//! UPDATE posts SET
//!     title = CASE WHEN id = $1 THEN $3 WHEN id = $2 THEN $4 ELSE title END
//! WHERE id IN ($1, $2)
//! ```
//!
//! Key placeholders are bound once and reused in the CASE arms and the IN list.

use crate::error::{OrmError, OrmResult};
use crate::qb::{MutationQb, ParamList, SqlQb};
use crate::record::Record;

/// A batch UPDATE over `rows`, keyed by the first column of the first row.
#[derive(Debug, Clone)]
pub struct BatchUpdate {
    table: String,
    rows: Vec<Record>,
}

impl BatchUpdate {
    pub fn new(table: &str, rows: Vec<Record>) -> Self {
        Self {
            table: table.to_string(),
            rows,
        }
    }

    /// The reference column, if there is a first row with at least one column.
    pub fn reference_column(&self) -> Option<&str> {
        self.rows.first().and_then(|row| row.columns().next())
    }

    /// Columns updated by the batch (the first row's columns after the reference).
    pub fn update_columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.columns().skip(1).collect())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }
}

impl SqlQb for BatchUpdate {
    fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let Some(reference) = self.reference_column() else {
            return (format!("UPDATE {} SET WHERE 1=0", self.table), params);
        };

        // Rows without a key cannot be addressed and are left out.
        let keyed: Vec<(usize, &Record)> = self
            .rows
            .iter()
            .filter_map(|row| {
                row.get(reference)
                    .map(|key| (params.push(key.clone()), row))
            })
            .collect();

        let assignments: Vec<String> = self
            .update_columns()
            .into_iter()
            .map(|column| {
                let arms: String = keyed
                    .iter()
                    .filter_map(|(key_idx, row)| {
                        let value = row.get(column)?;
                        let value_idx = params.push(value.clone());
                        Some(format!("WHEN {reference} = ${key_idx} THEN ${value_idx} "))
                    })
                    .collect();
                format!("{column} = CASE {arms}ELSE {column} END")
            })
            .collect();

        let keys: Vec<String> = keyed.iter().map(|(idx, _)| format!("${idx}")).collect();

        let sql = format!(
            "UPDATE {} SET {} WHERE {} IN ({})",
            self.table,
            assignments.join(", "),
            reference,
            keys.join(", ")
        );
        (sql, params)
    }

    fn validate(&self) -> OrmResult<()> {
        let Some(first) = self.rows.first() else {
            return Err(OrmError::EmptyData("update_batch"));
        };
        if first.len() < 2 {
            return Err(OrmError::validation(
                "update_batch rows need a reference column and at least one column to update",
            ));
        }
        for (i, row) in self.rows.iter().enumerate().skip(1) {
            if let Some(missing) = first.columns().find(|c| !row.contains(c)) {
                return Err(OrmError::validation(format!(
                    "update_batch row {i} is missing column '{missing}'"
                )));
            }
        }
        Ok(())
    }
}

impl MutationQb for BatchUpdate {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("id", 1).with("title", "a").with("views", 10),
            Record::new().with("id", 2).with("title", "b").with("views", 20),
        ]
    }

    #[test]
    fn one_case_per_column_and_one_in_list() {
        let batch = BatchUpdate::new("posts", rows());
        batch.validate().unwrap();
        let (sql, params) = batch.build();
        assert_eq!(
            sql,
            "UPDATE posts SET \
             title = CASE WHEN id = $1 THEN $3 WHEN id = $2 THEN $4 ELSE title END, \
             views = CASE WHEN id = $1 THEN $5 WHEN id = $2 THEN $6 ELSE views END \
             WHERE id IN ($1, $2)"
        );
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn reference_is_first_column_of_first_row() {
        let batch = BatchUpdate::new(
            "t",
            vec![Record::new().with("slug", "x").with("id", 9)],
        );
        assert_eq!(batch.reference_column(), Some("slug"));
        assert_eq!(batch.update_columns(), ["id"]);
    }

    #[test]
    fn empty_rows_are_empty_data() {
        let err = BatchUpdate::new("t", vec![]).validate().unwrap_err();
        assert!(matches!(err, OrmError::EmptyData("update_batch")));
    }

    #[test]
    fn key_only_rows_are_rejected() {
        let err = BatchUpdate::new("t", vec![Record::new().with("id", 1)])
            .validate()
            .unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }

    #[test]
    fn missing_column_names_the_row() {
        let mut rows = rows();
        rows[1].remove("views");
        let err = BatchUpdate::new("posts", rows).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: update_batch row 1 is missing column 'views'"
        );
    }
}
