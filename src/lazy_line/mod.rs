pub mod line;
mod read_op;
mod write_op;

pub use line::LazyCsvLine;
