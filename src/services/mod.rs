pub mod command_parser;
pub mod context_reader;
pub mod download_index;
pub mod downloader;
pub mod file_naming;
pub mod request_builder;
pub mod row_enumerator;

pub use command_parser::{parse_reply, Command};
pub use context_reader::read_page_context;
pub use downloader::Downloader;
pub use request_builder::RowRequest;
pub use row_enumerator::list_rows;
