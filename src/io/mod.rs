mod csv_io;
mod json_io;

pub use csv_io::{read_series_csv, write_series_csv, SeriesRow};
pub use json_io::{read_json, read_json_from_bytes, write_json};
