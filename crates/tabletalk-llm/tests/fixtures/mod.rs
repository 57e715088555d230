//! Shared fixtures for the llm integration tests

/// A small example corpus in the on-disk block format.
pub const EXAMPLE_CORPUS: &str = "\
###
How many orders were placed in total?
---
SELECT COUNT(*) FROM ssa_order_data;
###
What was the total revenue per category?
---
SELECT c.category, SUM(o.sales_revenue) AS revenue
FROM ssa_order_data AS o
JOIN ssa_category_data AS c ON o.sku_code = c.sku_code
GROUP BY c.category;
###
Which city had the highest order amount?
---
SELECT city, SUM(order_amount) AS total_orders
FROM ssa_order_data
GROUP BY city
ORDER BY total_orders DESC
LIMIT 1;
###
What is the average MRP across SKUs?
---
SELECT ROUND(CAST(AVG(mrp) AS NUMERIC), 2) FROM ssa_category_data;
";
