pub mod reading_csv_file;

pub use reading_csv_file::ReadingCsvFileSource;
