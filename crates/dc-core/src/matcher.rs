//! Key-based inner join of two prepared tables

use crate::error::{Error, Result};
use crate::prepare::{PreparedTable, Source};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The result of joining two tables on a key column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedTable {
    /// Name of the join column
    pub key_column: String,
    /// Output column names: key, then file1 columns, then file2 columns.
    /// Columns present in both files carry a `_file1` / `_file2` suffix.
    pub columns: Vec<String>,
    /// Matched rows
    pub rows: Vec<MatchedRow>,
}

/// One pairing of a file1 row with a file2 row sharing the same key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRow {
    /// Row number in file1
    pub row_number_file1: usize,
    /// Row number in file2
    pub row_number_file2: usize,
    /// Values aligned with [`JoinedTable::columns`]; the key comes first
    pub values: Vec<String>,
}

impl MatchedRow {
    /// The shared key value
    pub fn key(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }

    /// Row number for a given source
    pub fn row_number(&self, source: Source) -> usize {
        match source {
            Source::File1 => self.row_number_file1,
            Source::File2 => self.row_number_file2,
        }
    }
}

impl JoinedTable {
    /// Column index by output name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get the number of matched rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Inner-join two prepared tables on `key_column`.
///
/// Every file1 row is paired with every file2 row carrying an equal key, so
/// duplicate keys multiply. Output follows file1 order, then file2 order
/// within a key.
pub fn join_on_key(left: &PreparedTable, right: &PreparedTable, key_column: &str) -> Result<JoinedTable> {
    let left_key = key_index(left, key_column)?;
    let right_key = key_index(right, key_column)?;

    let left_names: HashSet<&str> = left.columns.iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right.columns.iter().map(String::as_str).collect();

    let mut columns = vec![key_column.to_string()];
    for (i, name) in left.columns.iter().enumerate() {
        if i != left_key {
            columns.push(output_name(name, right_names.contains(name.as_str()), left.source));
        }
    }
    for (i, name) in right.columns.iter().enumerate() {
        if i != right_key {
            columns.push(output_name(name, left_names.contains(name.as_str()), right.source));
        }
    }

    // Build side: file2 rows indexed by key, in file order
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        if let Some(key) = row.get(right_key) {
            index.entry(key).or_default().push(i);
        }
    }

    let mut rows = Vec::new();
    for left_row in &left.rows {
        let Some(key) = left_row.get(left_key) else {
            continue;
        };
        let Some(matches) = index.get(key) else {
            continue;
        };

        for &right_idx in matches {
            let right_row = &right.rows[right_idx];

            let mut values = Vec::with_capacity(columns.len());
            values.push(key.to_string());
            values.extend(
                left_row
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != left_key)
                    .map(|(_, v)| v.clone()),
            );
            values.extend(
                right_row
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != right_key)
                    .map(|(_, v)| v.clone()),
            );

            rows.push(MatchedRow {
                row_number_file1: left_row.number,
                row_number_file2: right_row.number,
                values,
            });
        }
    }

    log::debug!(
        "joined {} x {} rows on '{}' into {} matches",
        left.row_count(),
        right.row_count(),
        key_column,
        rows.len()
    );

    Ok(JoinedTable {
        key_column: key_column.to_string(),
        columns,
        rows,
    })
}

fn key_index(table: &PreparedTable, key_column: &str) -> Result<usize> {
    table
        .column_index(key_column)
        .ok_or_else(|| Error::MissingColumn {
            column: key_column.to_string(),
            table: table.source.label().to_string(),
        })
}

fn output_name(name: &str, shared: bool, source: Source) -> String {
    if shared {
        source.tag(name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_csv_str;
    use crate::normalize::KeyValidity;
    use crate::prepare::prepare_table;

    fn prepared(csv: &str, source: Source) -> PreparedTable {
        let table = parse_csv_str(csv, "t.csv").unwrap();
        prepare_table(&table, source, "id", KeyValidity::Off)
    }

    #[test]
    fn test_join_suffixes_shared_columns() {
        let left = prepared("id,name,only_left\n1,a,x\n", Source::File1);
        let right = prepared("only_right,name,id\ny,b,1\n", Source::File2);

        let joined = join_on_key(&left, &right, "id").unwrap();

        assert_eq!(
            joined.columns,
            vec!["id", "name_file1", "only_left", "only_right", "name_file2"]
        );
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.rows[0].values, vec!["1", "a", "x", "y", "b"]);
        assert_eq!(joined.rows[0].key(), "1");
    }

    #[test]
    fn test_join_is_inner() {
        let left = prepared("id,v\n1,a\n2,b\n3,c\n", Source::File1);
        let right = prepared("id,v\n3,c\n4,d\n1,a\n", Source::File2);

        let joined = join_on_key(&left, &right, "id").unwrap();

        let keys: Vec<&str> = joined.rows.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["1", "3"]);
        assert_eq!(joined.rows[0].row_number_file1, 1);
        assert_eq!(joined.rows[0].row_number_file2, 3);
        assert_eq!(joined.rows[1].row_number(Source::File1), 3);
        assert_eq!(joined.rows[1].row_number(Source::File2), 1);
    }

    #[test]
    fn test_duplicate_keys_cross_product() {
        let left = prepared("id,v\nK,a\nK,b\n", Source::File1);
        let right = prepared("id,v\nK,c\n", Source::File2);

        let joined = join_on_key(&left, &right, "id").unwrap();
        assert_eq!(joined.row_count(), 2);

        let left = prepared("id,v\nK,a\nK,b\n", Source::File1);
        let right = prepared("id,v\nK,c\nK,d\nK,e\n", Source::File2);

        let joined = join_on_key(&left, &right, "id").unwrap();
        assert_eq!(joined.row_count(), 6);
    }

    #[test]
    fn test_numeric_keys_match_across_representations() {
        let left = prepared("id,v\n1.0,a\n", Source::File1);
        let right = prepared("id,v\n1,a\n", Source::File2);

        let joined = join_on_key(&left, &right, "id").unwrap();
        assert_eq!(joined.row_count(), 1);
    }

    #[test]
    fn test_missing_key_column() {
        let left = prepared("id,v\n1,a\n", Source::File1);
        let right = prepared("code,v\n1,a\n", Source::File2);

        let err = join_on_key(&left, &right, "id").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }
}
