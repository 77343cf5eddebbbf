//! Fenced file blocks in agent responses.
//!
//! Responses carry structured payloads as fenced blocks, e.g.
//! ```` ```json file="actions.json" ````. Extraction works on partial text: an unterminated
//! last block is returned with the body received so far.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub lang: Option<String>,
    pub file_name: Option<String>,
    pub body: String,
    pub complete: bool,
}

impl FileBlock {
    /// Extension of the declared file name, falling back to the fence language.
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
            .or(self.lang.as_deref())
    }
}

pub fn extract_file_blocks(text: &str) -> Vec<FileBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<FileBlock> = None;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if let Some(info) = trimmed.strip_prefix("```") {
                    current = Some(open_block(info));
                }
            }
            Some(block) => {
                if trimmed == "```" {
                    block.complete = true;
                    blocks.extend(current.take());
                } else {
                    block.body.push_str(line);
                }
            }
        }
    }
    blocks.extend(current);
    blocks
}

/// Last block with the given extension (`json`), if any.
pub fn find_file_block(text: &str, extension: &str) -> Option<FileBlock> {
    extract_file_blocks(text)
        .into_iter()
        .rev()
        .find(|block| block.extension() == Some(extension))
}

/// Text outside fenced blocks, trimmed.
pub fn strip_file_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut inside = false;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if inside {
            inside = trimmed != "```";
            continue;
        }
        if trimmed.starts_with("```") {
            inside = true;
            continue;
        }
        out.push_str(line);
    }
    out.trim().to_string()
}

fn open_block(info: &str) -> FileBlock {
    let mut lang = None;
    let mut file_name = None;
    for token in info.split_whitespace() {
        if let Some(value) = token
            .strip_prefix("file=")
            .or_else(|| token.strip_prefix("fileName="))
        {
            let name = value.trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                file_name = Some(name.to_string());
            }
        } else if lang.is_none() && !token.contains('=') {
            lang = Some(token.to_ascii_lowercase());
        }
    }
    FileBlock {
        lang,
        file_name,
        body: String::new(),
        complete: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = "Adding a banner.\n```json file=\"actions.json\"\n[\"a\",\":root\",\"delete\"]\n```\nDone.\n";

    #[test]
    fn extracts_complete_block() {
        let blocks = extract_file_blocks(RESPONSE);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lang.as_deref(), Some("json"));
        assert_eq!(blocks[0].file_name.as_deref(), Some("actions.json"));
        assert_eq!(blocks[0].body, "[\"a\",\":root\",\"delete\"]\n");
        assert!(blocks[0].complete);
        assert_eq!(blocks[0].extension(), Some("json"));
    }

    #[test]
    fn unterminated_block_is_returned_so_far() {
        let partial = "Plan\n```json\n[\"a\",\":root\",\"delete\"]\n[\"b\"";
        let block = find_file_block(partial, "json").expect("block");
        assert!(!block.complete);
        assert_eq!(block.body, "[\"a\",\":root\",\"delete\"]\n[\"b\"");
    }

    #[test]
    fn later_block_supersedes_draft() {
        let text = concat!(
            "Draft:\n```json\n[\"a\",\":root\",\"delete\"]\n```\n",
            "Corrected:\n```json file=\"actions.json\"\n[\"b\",\":root\",\"delete\"]\n```\n",
            "```text\nnotes\n```\n",
        );
        let block = find_file_block(text, "json").expect("block");
        assert_eq!(block.file_name.as_deref(), Some("actions.json"));
        assert_eq!(block.body, "[\"b\",\":root\",\"delete\"]\n");
    }

    #[test]
    fn strip_keeps_prose_only() {
        assert_eq!(strip_file_blocks(RESPONSE), "Adding a banner.\nDone.");
        assert_eq!(strip_file_blocks("```json\n[1]"), "");
    }

    #[test]
    fn file_name_extension_wins_over_lang() {
        let text = "```text fileName='ids.json'\n{\"id\":\"u_1\"}\n```";
        assert_eq!(extract_file_blocks(text)[0].extension(), Some("json"));
    }
}
