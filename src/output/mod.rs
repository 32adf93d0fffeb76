//! Batch file output for the CLI.

mod batch_writer;

pub use batch_writer::{batch_file_name, write_batch, AtomicBatchWriter};
