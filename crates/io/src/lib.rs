// Delimited-text I/O for grid exports

pub mod delimited;

pub use delimited::{
    decode_delimited, default_cell_transform, encode_delimited, extract_formatted, import_table,
    import_table_with_delimiter, CellTransform, DEFAULT_DELIMITER,
};
