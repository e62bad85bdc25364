//! Module used to handle rustyline library.

use rustyline::completion::Candidate;
use rustyline::history::FileHistory;
use rustyline::{
    Completer, CompletionType, Config, Context, Editor, Helper, Highlighter, Hinter, Validator,
};
use std::fs::read_dir;
use std::path::PathBuf;
use tracing::warn;
use trie_rs::{Trie, TrieBuilder};

use crate::ast::BuiltIn;
use crate::system::is_executable;

pub fn create_editor(paths: &[PathBuf]) -> anyhow::Result<Editor<ShellHelper, FileHistory>> {
    let completer = ShellCompleter::new(paths);
    let helper = ShellHelper::new(completer);
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(helper));
    Ok(editor)
}

#[derive(Helper, Completer, Hinter, Highlighter, Validator)]
pub struct ShellHelper {
    #[rustyline(Completer)]
    completer: ShellCompleter,
}

impl ShellHelper {
    fn new(completer: ShellCompleter) -> Self {
        Self { completer }
    }
}

/// Completes the command name, i.e. the first word of the line.
pub struct ShellCompleter {
    /// Built-in names and the executables found on the search path when the
    /// editor was created.
    trie: Trie<u8>,
}

impl ShellCompleter {
    fn new(paths: &[PathBuf]) -> Self {
        let mut trie_builder = trie_builder_with_path_executables(paths);
        for built_in in BuiltIn::ALL {
            trie_builder.push(built_in.name());
        }
        Self {
            trie: trie_builder.build(),
        }
    }

    /// Every completion of `prefix`, as the text to add after it.
    fn suffixes(&self, prefix: &str) -> Vec<String> {
        self.trie.postfix_search(prefix).collect()
    }
}

impl rustyline::completion::Completer for ShellCompleter {
    type Candidate = ShellCompletionCandidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<ShellCompletionCandidate>)> {
        let prefix = &line[..pos];
        if prefix.is_empty() || prefix.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let completions = self
            .suffixes(prefix)
            .into_iter()
            .map(|completion| ShellCompletionCandidate::new(prefix, completion))
            .collect();

        Ok((pos, completions))
    }
}

/// Collects the names of executables in each search path directory.
fn trie_builder_with_path_executables(paths: &[PathBuf]) -> TrieBuilder<u8> {
    let mut trie_builder = TrieBuilder::new();
    for path in paths {
        let entries = match read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read search path directory");
                continue;
            }
        };
        for dir_entry in entries.flatten() {
            if let Some(name) = dir_entry.file_name().to_str() {
                if is_executable(&dir_entry.path()) {
                    trie_builder.push(name);
                }
            }
        }
    }
    trie_builder
}

pub struct ShellCompletionCandidate {
    display: String,
    replacement: String,
}

impl ShellCompletionCandidate {
    fn new(prefix: &str, completion: String) -> Self {
        let mut display = String::new();
        display.push_str(prefix);
        display.push_str(&completion);

        let mut replacement = completion;
        replacement.push(' ');

        Self {
            display,
            replacement,
        }
    }
}

impl Candidate for ShellCompletionCandidate {
    fn display(&self) -> &str {
        &self.display
    }

    fn replacement(&self) -> &str {
        &self.replacement
    }
}
