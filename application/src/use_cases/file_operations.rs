//! File operation strategy
//!
//! Maps the many spellings models use for file operations onto the
//! [`FileCapability`] port. Argument keys are normalized too: a model may
//! say `filename`, `file`, or `path` for the same thing.

use std::sync::Arc;

use async_trait::async_trait;
use dispatch_domain::tool::{FileOperation, Outcome, ResolverOutcome, ToolCall};

use crate::ports::file_capability::FileCapability;
use crate::ports::strategy::{ResolverStrategy, StrategyFault};

pub const NO_FILE_MANAGER: &str =
    "File operations are unavailable: no file manager is configured";

const NAME_KEYS: &[&str] = &["file_name", "filename", "path", "file", "name", "file_path"];
const SOURCE_KEYS: &[&str] = &["source", "src", "from", "source_path"];
const DESTINATION_KEYS: &[&str] = &["destination", "dst", "dest", "to", "target"];
const KEYWORD_KEYS: &[&str] = &["keyword", "query", "pattern", "search", "term"];
const CONTENT_KEYS: &[&str] = &["content", "text", "data", "contents", "body"];
const DIRECTORY_KEYS: &[&str] = &["path", "directory", "dir", "folder"];

fn missing(argument: &str) -> Outcome {
    Outcome::invalid_argument(format!("Missing required argument: {}", argument))
}

/// Content may legitimately be an empty string, so it is not filtered like
/// the other keys.
fn content(call: &ToolCall) -> Option<&str> {
    CONTENT_KEYS.iter().find_map(|key| call.get_string(key))
}

pub struct FileOperationResolver {
    files: Option<Arc<dyn FileCapability>>,
}

impl FileOperationResolver {
    pub fn new(files: Option<Arc<dyn FileCapability>>) -> Self {
        Self { files }
    }

    /// Run one operation against the collaborator.
    pub fn run(&self, operation: FileOperation, call: &ToolCall) -> Outcome {
        let Some(files) = self.files.as_deref() else {
            return Outcome::dependency_missing(NO_FILE_MANAGER);
        };

        let name = || call.first_string(NAME_KEYS);
        let text = match operation {
            FileOperation::Create => match name() {
                Some(name) => files.create_file(name, content(call).unwrap_or("")),
                None => return missing("file_name"),
            },
            FileOperation::Read => match name() {
                Some(name) => files.read_file(name),
                None => return missing("file_name"),
            },
            FileOperation::Write => match (name(), content(call)) {
                (Some(name), Some(content)) => files.write_to_file(name, content),
                (None, _) => return missing("file_name"),
                (_, None) => return missing("content"),
            },
            FileOperation::Delete => match name() {
                Some(name) => files.delete_file(name),
                None => return missing("file_name"),
            },
            FileOperation::List => files.list_files(call.first_string(DIRECTORY_KEYS)),
            FileOperation::Copy | FileOperation::Move => {
                let source = call.first_string(SOURCE_KEYS);
                let destination = call.first_string(DESTINATION_KEYS);
                match (source, destination) {
                    (Some(src), Some(dst)) if operation == FileOperation::Copy => {
                        files.copy_file(src, dst)
                    }
                    (Some(src), Some(dst)) => files.move_file(src, dst),
                    (None, _) => return missing("source"),
                    (_, None) => return missing("destination"),
                }
            }
            FileOperation::Search => match call.first_string(KEYWORD_KEYS) {
                Some(keyword) => files.search_files(keyword, call.first_string(DIRECTORY_KEYS)),
                None => return missing("keyword"),
            },
        };
        Outcome::completed(text)
    }
}

#[async_trait]
impl ResolverStrategy for FileOperationResolver {
    fn name(&self) -> &'static str {
        "file_operations"
    }

    fn applies(&self, call: &ToolCall) -> bool {
        FileOperation::from_alias(&call.name).is_some()
    }

    async fn resolve(&self, call: &ToolCall) -> Result<ResolverOutcome, StrategyFault> {
        let operation = FileOperation::from_alias(&call.name)
            .ok_or_else(|| StrategyFault::apply(self.name(), "not a file operation"))?;
        Ok(self.run(operation, call).into())
    }
}
