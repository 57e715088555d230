//! Shared fixtures for SQL pipeline tests

/// Schema documentation matching the demo sales dataset.
pub const SCHEMA_DOC: &str = r#"# Sales Schema Documentation

## Table Relationships

- `ssa_order_data.sku` = `ssa_category_data.variant_sku`

## Table: ssa_category_data

Product catalog with one row per sellable variant.

- `variant_sku` (VARCHAR): Unique identifier for a product variant.
  - Aliases: "sku code", "product id"
- `category` (VARCHAR): Product category name.
- `mrp` (REAL): Maximum retail price in rupees.
  - Aliases: "price", "retail price"

## Table: ssa_order_data

Order line items, one row per SKU per order.

- `order_id` (BIGINT): Order identifier.
- `sku` (VARCHAR): Product variant sold, joins to the catalog.
- `order_date` (DATE): Date the order was placed.
- `order_quantity` (INTEGER): Units sold on the line.
- `sales_revenue` (REAL): Line revenue after discounts.
  - Aliases: "revenue", "sales"
"#;

/// Typical chatty model output: prose, a fenced block, MySQL quoting,
/// and a two-argument ROUND.
pub const CHATTY_MYSQL_OUTPUT: &str = "Here is the query you asked for:\n\n\
```sql\n\
SELECT `category`, ROUND(AVG(`mrp`), 2) AS avg_price\n\
FROM `ssa_category_data`\n\
GROUP BY `category`;\n\
```\n\
Let me know if you need anything else!";

/// Output referencing a table that was never documented.
pub const HALLUCINATED_OUTPUT: &str =
    "SELECT customer_name, loyalty_tier FROM customer_master ORDER BY loyalty_tier;";

/// The exact sentence the prompt instructs the model to use when a
/// question cannot be answered from the schema.
pub const REFUSAL_OUTPUT: &str =
    "Error: The question cannot be answered with the available schema.";
