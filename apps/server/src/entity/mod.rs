//! SeaORM entity definitions for PostgreSQL database.

pub mod test_result_container;
