//! Tabular exports of the directory.
//!
//! PDF rendering stays with the UI layer; core only produces CSV text.

pub mod csv_export;
