// Database module
// PostgreSQL with the pgvector extension holds the chunk table

pub mod postgres;

pub use postgres::*;
