//! Shared fixtures for pipeline integration tests

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

/// A chatty model response with MySQL quoting and a two-argument ROUND,
/// the way a local model actually answers.
pub const GOOD_RESPONSE: &str = "Here's the query you need:\n\n\
```sql\n\
SELECT `category`, ROUND(AVG(`mrp`), 2) AS avg_price\n\
FROM `ssa_category_data`\n\
GROUP BY `category`;\n\
```\n\
Hope that helps!";

/// What `GOOD_RESPONSE` becomes after extraction and the rewrite pass.
pub const GOOD_SQL: &str = r#"SELECT "category", ROUND(CAST(AVG("mrp") AS NUMERIC), 2) AS avg_price FROM "ssa_category_data" GROUP BY "category""#;

/// A response referencing a table that was never documented.
pub const HALLUCINATED_RESPONSE: &str = "SELECT revenue FROM orders;";

/// A syntactically plausible query PostgreSQL will reject.
pub const DATEDIFF_RESPONSE: &str =
    "SELECT DATEDIFF(order_date, order_date) FROM ssa_order_data;";

/// The refusal line the prompt instructs the model to use.
pub const REFUSAL_RESPONSE: &str =
    "Error: The question cannot be answered with the available schema.";

/// Scripted analysis narration.
pub const ANALYSIS_RESPONSE: &str =
    "Chairs carry the highest average price at 1450.00 rupees, ahead of Desks and Lamps.";
