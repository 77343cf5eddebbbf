use std::collections::HashMap;

use crate::command::{CommandParams, ConfigureParams, MutationCommand};

/// One human-readable line per command. `titles` maps node ids to titles of the current
/// document; unknown ids are shown as-is.
pub fn summarize_commands(commands: &[MutationCommand], titles: &HashMap<String, String>) -> String {
    let mut titles = titles.clone();
    let mut lines = Vec::with_capacity(commands.len());
    for cmd in commands {
        let target = label(&titles, &cmd.target_id);
        let line = match &cmd.params {
            CommandParams::SetLayout(layout) if layout.is_fixed() => {
                format!("- Pinned {target} with a fixed layout")
            }
            CommandParams::SetLayout(_) => format!("- Adjusted the layout of {target}"),
            CommandParams::Configure(ConfigureParams::Style { path, .. }) => {
                format!("- Restyled {path} of {target}")
            }
            CommandParams::Configure(ConfigureParams::Property { path, .. }) => {
                format!("- Configured {path} of {target}")
            }
            CommandParams::AddChild(params) => {
                if !params.com_id.is_empty() && !params.title.is_empty() {
                    titles.insert(params.com_id.clone(), params.title.clone());
                }
                let child = if params.title.is_empty() {
                    params.namespace.clone()
                } else {
                    params.title.clone()
                };
                format!("- Added {child} to {target} ({})", cmd.selector)
            }
            CommandParams::Move(params) => format!(
                "- Moved {target} into {} ({})",
                label(&titles, &params.to.com_id),
                params.to.slot_id
            ),
            CommandParams::Delete(_) => format!("- Deleted {target}"),
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn label(titles: &HashMap<String, String>, id: &str) -> String {
    match titles.get(id) {
        Some(title) if !title.is_empty() => format!("{title}({id})"),
        _ => id.to_string(),
    }
}
