pub mod csv_import;

pub use csv_import::{bind_columns, read_table, InputFormat};
