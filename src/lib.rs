//! Stop-and-frisk incident records grouped by year, with a fixed set of
//! aggregate queries over them.

pub mod data;

pub use data::error::RowError;
pub use data::layout::ColumnLayout;
pub use data::loader::{load_file, load_file_with, Loaded, LoadOptions, MalformedRows};
pub use data::model::{Borough, Dataset, Gender, Race, Record, YearGroup};
pub use data::query::{BiasColumn, BiasRow, GenderBias, StopRates};
