//! Shared fixtures for catalog tests

use tabletalk_catalog::{LiveColumn, LiveSchema, LiveTable, QueryRows};

fn column(name: &str, data_type: &str, nullable: bool) -> LiveColumn {
    LiveColumn {
        name: name.to_string(),
        data_type: data_type.to_string(),
        is_nullable: nullable,
    }
}

/// Live snapshot of the demo sales schema, as information_schema would
/// report it.
pub fn sales_live_schema() -> LiveSchema {
    LiveSchema::new("public").with_tables(vec![
        LiveTable::new("ssa_category_data").with_columns(vec![
            column("variant_sku", "character varying", false),
            column("category", "character varying", true),
            column("mrp", "real", true),
        ]),
        LiveTable::new("ssa_order_data").with_columns(vec![
            column("order_id", "bigint", false),
            column("sku", "character varying", false),
            column("order_date", "date", true),
            column("order_quantity", "integer", true),
            column("sales_revenue", "real", true),
        ]),
    ])
}

/// A small aggregate result, the kind the ask pipeline produces.
pub fn revenue_by_category() -> QueryRows {
    QueryRows::new(
        vec!["category".to_string(), "revenue".to_string()],
        vec![
            vec![Some("Juices".to_string()), Some("18250.40".to_string())],
            vec![Some("Snacks".to_string()), Some("9120.00".to_string())],
        ],
    )
}
