//! Source manager: owns source buffers, tracks line/column, manages the
//! include stack. Grounded on this project's `IncludeHandler`.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::position::{FileId, SourceArea, SourcePosition};

/// A single loaded, immutable source buffer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: FileId,
    pub name: String,
    pub text: String,
    /// Byte offset of the start of each line, for position <-> text lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    fn new(id: FileId, name: String, text: String) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { id, name, text, line_starts }
    }

    /// The raw text of a given (zero-based) line, without its newline.
    pub fn line_text(&self, line: u32) -> &str {
        let idx = line as usize;
        let start = match self.line_starts.get(idx) {
            Some(s) => *s,
            None => return "",
        };
        let end = self.line_starts.get(idx + 1).map(|e| e - 1).unwrap_or(self.text.len());
        let end = end.min(self.text.len()).max(start);
        &self.text[start..end]
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

/// Interface an external caller implements to resolve `#include` targets.
/// Spec §6: `open(filename, search-paths-first) -> (readable stream | not-found)`.
pub trait IncludeProvider {
    fn open(&mut self, filename: &str, prefer_search_paths: bool) -> Option<String>;
    fn search_paths(&self) -> &[PathBuf];
    fn set_search_paths(&mut self, paths: Vec<PathBuf>);
}

/// Filesystem-backed include provider: the default, reusable implementation.
#[derive(Debug, Default)]
pub struct FilesystemIncludeProvider {
    search_paths: Vec<PathBuf>,
    /// Directories pushed as files get included, most-recently-included last.
    directory_stack: Vec<PathBuf>,
}

impl FilesystemIncludeProvider {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths, directory_stack: Vec::new() }
    }

    pub fn push_including_dir(&mut self, dir: PathBuf) {
        self.directory_stack.push(dir);
    }

    pub fn pop_including_dir(&mut self) {
        self.directory_stack.pop();
    }

    fn resolve(&self, filename: &str, prefer_search_paths: bool) -> Option<PathBuf> {
        let relative = Path::new(filename);
        let try_stack = |path: &Path| path.is_file().then(|| path.to_path_buf());
        let from_stack = || {
            self.directory_stack.iter().rev().find_map(|dir| try_stack(&dir.join(relative)))
        };
        let from_search = || self.search_paths.iter().find_map(|dir| try_stack(&dir.join(relative)));
        if prefer_search_paths {
            from_search().or_else(from_stack).or_else(|| try_stack(relative))
        } else {
            try_stack(relative).or_else(from_stack).or_else(from_search)
        }
    }
}

impl IncludeProvider for FilesystemIncludeProvider {
    fn open(&mut self, filename: &str, prefer_search_paths: bool) -> Option<String> {
        let path = self.resolve(filename, prefer_search_paths)?;
        std::fs::read_to_string(path).ok()
    }

    fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn set_search_paths(&mut self, paths: Vec<PathBuf>) {
        self.search_paths = paths;
    }
}

/// Owns every source buffer loaded during one compilation (the root plus any
/// transitively included files) and maps byte offsets to `(line, column)`.
#[derive(Debug, Default)]
pub struct SourceManager {
    files: Vec<SourceFile>,
    by_name: HashMap<String, FileId>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, name: impl Into<String>, text: String) -> FileId {
        let name = name.into();
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = self.files.len() as FileId;
        self.files.push(SourceFile::new(id, name.clone(), text));
        self.by_name.insert(name, id);
        id
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id as usize]
    }

    pub fn file_name(&self, id: FileId) -> &str {
        &self.files[id as usize].name
    }

    /// Position -> line-text + column for diagnostic excerpting.
    pub fn excerpt(&self, area: SourceArea) -> (&str, u32) {
        let file = self.file(area.start.file);
        (file.line_text(area.start.line), area.start.column)
    }

    pub fn position_display(&self, pos: SourcePosition) -> String {
        format!("{}:{}:{}", self.file_name(pos.file), pos.line + 1, pos.column + 1)
    }
}
