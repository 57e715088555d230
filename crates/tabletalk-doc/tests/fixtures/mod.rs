//! Shared documents for doc integration tests
//!
//! The two-table sales schema used across the workspace: a product catalog
//! and an order line table joined on SKU.

/// The complete, well-formed schema documentation
pub const SALES_DOC: &str = r#"# Sales Database Schema

Reference documentation for the reporting database.

## Table Relationships

- `ssa_order_data.sku` = `ssa_category_data.variant_sku`

## Table: ssa_category_data

Product catalog with one row per sellable variant.

- `variant_sku` (VARCHAR): Unique product variant identifier
  - Aliases: "sku code", "product id", "variant code"
- `title` (VARCHAR): Product display name
  - Aliases: "product name", "item name"
- `super_category` (VARCHAR): Top-level product grouping
- `category` (VARCHAR): Product category within the super category
- `flavour` (VARCHAR): Product flavour variant
- `mrp` (REAL): Maximum retail price
  - Aliases: "list price", "retail price"
- `shelf_life_days` (INTEGER): Shelf life in days
- `launch_date` (DATE): First day the variant was sellable

## Table: ssa_order_data

One row per ordered line item.

- `order_id` (BIGINT): Order identifier
- `sku` (VARCHAR): Ordered product variant
- `order_date` (DATE): Calendar date of the order
- `customer_type` (VARCHAR): Buyer segment, B2B or B2C
  - Aliases: "buyer segment", "customer segment"
- `order_quantity` (INTEGER): Units ordered
  - Aliases: "units", "quantity sold"
- `sales_revenue` (REAL): Net revenue for the line
  - Aliases: "revenue", "sales"
- `sales_discount` (REAL): Discount applied to the line
  - Aliases: "discount"
"#;

/// A document with structural problems: a bad relationship, an unsupported
/// type, and a duplicate column
pub const BROKEN_DOC: &str = r#"## Table Relationships

- `ssa_order_data.sku` = `warehouse_stock.sku`
- this line is not a relationship

## Table: ssa_order_data

One row per ordered line item.

- `order_id` (BIGINT): Order identifier
- `total` (DECIMAL): Order total
- `order_id` (INTEGER): Duplicate identifier
"#;
