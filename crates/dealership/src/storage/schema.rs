//! `SQLite` schema definitions for dealership.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the users table.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'customer',
    can_access_dashboard INTEGER NOT NULL DEFAULT 0,
    can_create INTEGER NOT NULL DEFAULT 0,
    can_update INTEGER NOT NULL DEFAULT 0,
    can_delete INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the vehicles table.
pub const CREATE_VEHICLES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    brand TEXT NOT NULL,
    vehicle_type TEXT NOT NULL,
    price INTEGER NOT NULL CHECK (price >= 0),
    year INTEGER NOT NULL,
    description TEXT NOT NULL,
    image TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the orders table.
///
/// `user_id` is not a foreign key; orders survive deletion of the account
/// that placed them.
pub const CREATE_ORDERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    phone_no TEXT NOT NULL,
    postal_code TEXT NOT NULL,
    total_price INTEGER NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the order items table.
pub const CREATE_ORDER_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS order_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    vehicle_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    image TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    price INTEGER NOT NULL
)
";

/// SQL statement to create the feedback table.
pub const CREATE_FEEDBACK_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    subject TEXT,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// Index for keyword search over vehicle names.
pub const CREATE_VEHICLE_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_vehicles_name ON vehicles(name)
";

/// Index for listing a customer's orders.
pub const CREATE_ORDER_USER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at DESC)
";

/// Index for loading the items of an order.
pub const CREATE_ORDER_ITEMS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id, position)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_VEHICLES_TABLE,
    CREATE_ORDERS_TABLE,
    CREATE_ORDER_ITEMS_TABLE,
    CREATE_FEEDBACK_TABLE,
    CREATE_VEHICLE_NAME_INDEX,
    CREATE_ORDER_USER_INDEX,
    CREATE_ORDER_ITEMS_INDEX,
    CREATE_METADATA_TABLE,
];
