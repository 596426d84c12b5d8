//! File and command extraction from generated text.
//!
//! Code comes out of fenced blocks. A file name is taken from the fence info
//! string when it contains a dot ("```src/main.rs"), otherwise from a
//! preceding `# File:` or `// File:` hint line; anonymous blocks fall back
//! to a role-derived name. Commands are recognized line by line against an
//! OS-specific prefix list.

use riverboat_types::response::FileSpec;

const FILE_HINTS: [&str; 2] = ["# File:", "// File:"];

const UNIX_PREFIXES: [&str; 20] = [
    "ls", "cd", "cp", "mv", "mkdir", "cat", "grep", "find", "chmod", "ps", "git", "npm", "pip",
    "python", "cargo", "make", "curl", "tar", "touch", "sudo",
];

const WINDOWS_PREFIXES: [&str; 16] = [
    "dir", "copy", "move", "cd", "md", "type", "ren", "cls", "ipconfig", "tasklist", "git", "npm",
    "pip", "python", "powershell", "echo",
];

/// Extract fenced code blocks as file specs.
///
/// An unterminated trailing fence is dropped; truncated generations do not
/// produce half files.
pub fn code_blocks(content: &str, role: &str, default_extension: &str) -> Vec<FileSpec> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current: Vec<&str> = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            if in_block {
                let path = pending_name
                    .take()
                    .unwrap_or_else(|| anonymous_name(role, default_extension, blocks.len()));
                blocks.push(FileSpec::new(path, current.join("\n")));
                current.clear();
                in_block = false;
            } else {
                in_block = true;
                let info = trimmed.trim_start_matches('`').trim();
                if info.contains('.') {
                    pending_name = Some(info.to_string());
                }
            }
        } else if in_block {
            current.push(line);
        } else if let Some(hint) = FILE_HINTS
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
        {
            let hint = hint.trim();
            if !hint.is_empty() {
                pending_name = Some(hint.to_string());
            }
        }
    }
    blocks
}

fn anonymous_name(role: &str, extension: &str, index: usize) -> String {
    let stem = role.to_lowercase();
    if index == 0 {
        format!("{stem}_output{extension}")
    } else {
        format!("{stem}_output_{}{extension}", index + 1)
    }
}

/// Extract shell commands for the target OS, capped at `max_commands`.
///
/// A line counts when its first token is a known command for that OS; `$ `
/// and `> ` shell-prompt prefixes are stripped first.
pub fn commands(content: &str, target_os: &str, max_commands: usize) -> Vec<String> {
    let prefixes: &[&str] = if target_os.to_lowercase().starts_with("win") {
        &WINDOWS_PREFIXES
    } else {
        &UNIX_PREFIXES
    };

    let mut found = Vec::new();
    for line in content.lines() {
        if found.len() == max_commands {
            break;
        }
        let mut candidate = line.trim();
        if candidate.starts_with("```") {
            continue;
        }
        for prompt in ["$ ", "> "] {
            if let Some(rest) = candidate.strip_prefix(prompt) {
                candidate = rest.trim();
            }
        }
        let Some(first) = candidate.split_whitespace().next() else {
            continue;
        };
        if prefixes.contains(&first.to_lowercase().as_str()) {
            found.push(candidate.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_fence_becomes_file() {
        let content = "Here is the code:\n```src/add.rs\nfn add(a: i32, b: i32) -> i32 { a + b }\n```\n";
        let blocks = code_blocks(content, "BackEndDev", ".txt");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "src/add.rs");
        assert!(blocks[0].content.contains("fn add"));
    }

    #[test]
    fn language_fence_gets_default_name() {
        let content = "```rust\nfn main() {}\n```";
        let blocks = code_blocks(content, "BackEndDev", ".rs");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "backenddev_output.rs");
    }

    #[test]
    fn file_hint_names_the_next_block() {
        let content = "# File: lib/util.py\n```python\nprint('hi')\n```";
        let blocks = code_blocks(content, "BackEndDev", ".txt");
        assert_eq!(blocks[0].path, "lib/util.py");

        let slashed = "// File: src/app.js\n```\nconsole.log(1)\n```";
        let blocks = code_blocks(slashed, "FrontEndDev", ".txt");
        assert_eq!(blocks[0].path, "src/app.js");
    }

    #[test]
    fn multiple_anonymous_blocks_get_numbered_names() {
        let content = "```\nfirst\n```\ntext\n```\nsecond\n```";
        let blocks = code_blocks(content, "BackEndDev", ".txt");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].path, "backenddev_output.txt");
        assert_eq!(blocks[1].path, "backenddev_output_2.txt");
    }

    #[test]
    fn unterminated_fence_is_dropped() {
        let content = "```rust\nfn main() {";
        assert!(code_blocks(content, "BackEndDev", ".rs").is_empty());
    }

    #[test]
    fn fence_indented_in_list_still_parses() {
        let content = "  ```config.toml\n  key = 1\n  ```";
        let blocks = code_blocks(content, "BackEndDev", ".txt");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "config.toml");
    }

    #[test]
    fn unix_commands_extracted_with_prompt_stripped() {
        let content = "Run these:\n$ mkdir build\n$ cargo build --release\nnot a command line\n";
        let found = commands(content, "linux", 5);
        assert_eq!(found, vec!["mkdir build", "cargo build --release"]);
    }

    #[test]
    fn windows_prefixes_differ_from_unix() {
        let content = "dir C:\\project\nls -la\n";
        let windows = commands(content, "windows", 5);
        assert_eq!(windows, vec!["dir C:\\project"]);

        let unix = commands(content, "linux", 5);
        assert_eq!(unix, vec!["ls -la"]);
    }

    #[test]
    fn command_cap_is_enforced() {
        let content = "ls a\nls b\nls c\nls d\nls e\nls f\nls g\n";
        assert_eq!(commands(content, "linux", 5).len(), 5);
    }

    #[test]
    fn darwin_uses_unix_prefixes() {
        let found = commands("ls -la\n", "darwin", 5);
        assert_eq!(found, vec!["ls -la"]);
    }

    #[test]
    fn fenced_command_lines_count_but_fence_markers_do_not() {
        let content = "```bash\ngit status\n```";
        assert_eq!(commands(content, "linux", 5), vec!["git status"]);
    }
}
