//! Table definitions for the local fittings store

use super::types::*;

/// Append-only mapping of canonical item-set keys to query ids.
pub static QUERIES: TableSchema = TableSchema {
    name: "queries",
    columns: &[
        Column::key("id"),
        Column::required("items", ColumnType::Text),
    ],
    indexes: &[Index::on(&["items"])],
};

/// One row per accepted killmail; `data` holds the canonical fitting.
pub static FITS: TableSchema = TableSchema {
    name: "fits",
    columns: &[
        Column::key("killmail"),
        Column::required("ship", ColumnType::Integer),
        Column::required("cost", ColumnType::Integer),
        Column::required("data", ColumnType::Json),
    ],
    indexes: &[Index::on(&["ship"])],
};

/// Junction table of each fitting's query items.
pub static FIT_ITEMS: TableSchema = TableSchema {
    name: "fit_items",
    columns: &[
        Column::required("killmail", ColumnType::Integer),
        Column::required("item", ColumnType::Integer),
    ],
    indexes: &[
        Index::unique(&["killmail", "item"]),
        Index::on(&["item"]),
    ],
};

pub static ALL_TABLES: &[&TableSchema] = &[&QUERIES, &FITS, &FIT_ITEMS];

/// Look up a table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

/// Names of every table in the store
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_table() {
        assert_eq!(get_table("queries").map(|t| t.name), Some("queries"));
        assert!(get_table("killmails").is_none());
    }

    #[test]
    fn test_table_names_unique() {
        let mut names = table_names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL_TABLES.len());
    }
}
