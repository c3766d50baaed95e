use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);

    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| {
            let pk = if col.primary_key { " PRIMARY KEY" } else { "" };
            let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
            format!(
                "    {} {}{}{}",
                col.name,
                col.col_type.sql_type(),
                pk,
                null_constraint
            )
        })
        .collect();

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for a table
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let unique = if index.unique { "UNIQUE " } else { "" };
            format!(
                "CREATE {}INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                unique,
                schema.name,
                index.columns.join("_"),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}
