//! Text extraction from source documents, and the record builder that turns
//! a text file into a one-instruction queue.

pub mod command;
pub mod extractor;
pub mod folder;
pub mod records;

pub use command::CommandExtractor;
pub use extractor::{DocumentKind, ExtractorSet, PlainTextExtractor, TextExtractor};
pub use folder::{FolderReport, MERGED_FILE_NAME, merge_text_files, process_folder};
pub use longwrite_utils::error::ExtractionError;
pub use records::txt_to_jsonl;
