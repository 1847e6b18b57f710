use super::ExpStore;
use crate::{
    customer_subsystem::{CustomerRecord, EmployeeRecord, OrderRecord, OrderState, ProductRecord},
    error::ExpResult,
};
use rusqlite::{params, OptionalExtension};

fn order_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRecord> {
    Ok(OrderRecord {
        order_id: row.get(0)?,
        customer_id: row.get(1)?,
        state: row.get(2)?,
        amount_total: row.get(3)?,
        ordered_at: row.get(4)?,
    })
}

impl ExpStore {
    // ── Customer ──────────────────────────────────────────────────

    pub fn upsert_customer(&self, c: &CustomerRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO customer (customer_id, name, phone, email)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (customer_id) DO UPDATE
             SET name = excluded.name, phone = excluded.phone, email = excluded.email",
            params![&c.customer_id, &c.name, c.phone.as_deref(), c.email.as_deref()],
        )?;
        Ok(())
    }

    pub fn get_customer(&self, customer_id: &str) -> ExpResult<Option<CustomerRecord>> {
        self.conn
            .query_row(
                "SELECT customer_id, name, phone, email FROM customer WHERE customer_id = ?1",
                params![customer_id],
                |row| {
                    Ok(CustomerRecord {
                        customer_id: row.get(0)?,
                        name: row.get(1)?,
                        phone: row.get(2)?,
                        email: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Product ───────────────────────────────────────────────────

    pub fn upsert_product(&self, p: &ProductRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO product (product_id, name, category) VALUES (?1, ?2, ?3)
             ON CONFLICT (product_id) DO UPDATE
             SET name = excluded.name, category = excluded.category",
            params![&p.product_id, &p.name, p.category],
        )?;
        Ok(())
    }

    pub fn get_product(&self, product_id: &str) -> ExpResult<Option<ProductRecord>> {
        self.conn
            .query_row(
                "SELECT product_id, name, category FROM product WHERE product_id = ?1",
                params![product_id],
                |row| {
                    Ok(ProductRecord {
                        product_id: row.get(0)?,
                        name: row.get(1)?,
                        category: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Employee ──────────────────────────────────────────────────

    pub fn upsert_employee(&self, e: &EmployeeRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO employee (employee_id, name) VALUES (?1, ?2)
             ON CONFLICT (employee_id) DO UPDATE SET name = excluded.name",
            params![&e.employee_id, &e.name],
        )?;
        Ok(())
    }

    pub fn employee_exists(&self, employee_id: &str) -> ExpResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM employee WHERE employee_id = ?1",
            params![employee_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ── Order ─────────────────────────────────────────────────────

    pub fn upsert_order(&self, o: &OrderRecord) -> ExpResult<()> {
        self.conn.execute(
            "INSERT INTO pos_order (order_id, customer_id, state, amount_total, ordered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (order_id) DO UPDATE
             SET customer_id = excluded.customer_id, state = excluded.state,
                 amount_total = excluded.amount_total, ordered_at = excluded.ordered_at",
            params![&o.order_id, &o.customer_id, o.state, o.amount_total, o.ordered_at],
        )?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> ExpResult<Option<OrderRecord>> {
        self.conn
            .query_row(
                "SELECT order_id, customer_id, state, amount_total, ordered_at
                 FROM pos_order WHERE order_id = ?1",
                params![order_id],
                order_row_mapper,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set_order_state(&self, order_id: &str, state: OrderState) -> ExpResult<usize> {
        let changed = self.conn.execute(
            "UPDATE pos_order SET state = ?1 WHERE order_id = ?2",
            params![state, order_id],
        )?;
        Ok(changed)
    }

    /// Full order history of one customer, every state included.
    pub fn orders_for_customer(&self, customer_id: &str) -> ExpResult<Vec<OrderRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, customer_id, state, amount_total, ordered_at
             FROM pos_order WHERE customer_id = ?1
             ORDER BY ordered_at ASC",
        )?;
        let rows = stmt.query_map(params![customer_id], order_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
