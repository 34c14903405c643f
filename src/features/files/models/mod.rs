mod file;

pub use file::{File, FileFilter, FileListing, FileType, NewFile, PurgeOutcome};
