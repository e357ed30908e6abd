pub mod excel_read;
pub mod excel_write;
pub mod locate;
pub mod merged_cells;
