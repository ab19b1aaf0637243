//! Rendering the registry as an annotated, ready-to-edit template.

use super::constants::{BANNER_SEPARATOR, BANNER_WIDTH, WRAP_WIDTH};
use super::registry::Registry;

const COMMENT: &str = "## ";

impl Registry {
    /// One section per group: a centred banner, then for every key its
    /// wrapped description, aliases, default and a commented-out
    /// assignment.
    pub fn render_documentation(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        for (group, entries) in self.sections() {
            lines.push(banner(&group));

            for entry in entries {
                let literal = entry.default.literal();
                lines.push(String::new());
                let description = wrap(&entry.description, WRAP_WIDTH, COMMENT);
                lines.push(format!("{COMMENT}{description}"));
                if !entry.aliases.is_empty() {
                    lines.push(format!("{COMMENT}Aliases: {}", entry.aliases.join(", ")));
                }
                lines.push(format!("{COMMENT}Defaults to: {literal}"));
                lines.push(format!("#{} = {literal}", entry.key));
            }

            lines.push(String::new());
            lines.push(BANNER_SEPARATOR.to_string().repeat(BANNER_WIDTH));
            lines.push(String::new());
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

fn banner(group: &str) -> String {
    let width = group.chars().count();
    let side = (BANNER_WIDTH.saturating_sub(width) / 2).saturating_sub(1);
    let fill = BANNER_SEPARATOR.to_string().repeat(side);
    let mut line = format!("{fill} {group} {fill}");

    while line.chars().count() < BANNER_WIDTH {
        line.push(BANNER_SEPARATOR);
    }
    line
}

/// Greedy word wrap. The first line gets the full width, continuation
/// lines are prefixed with `indent`, which counts towards the width.
/// Words longer than a line are split.
fn wrap(text: &str, width: usize, indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        loop {
            let prefix = if lines.is_empty() { 0 } else { indent.len() };
            let room = width.saturating_sub(prefix).max(1);
            let used = current.chars().count();
            let needed = if used == 0 { word.len() } else { used + 1 + word.len() };

            if needed <= room {
                if used > 0 {
                    current.push(' ');
                }
                current.extend(word.iter());
                break;
            }

            if used > 0 {
                lines.push(std::mem::take(&mut current));
                continue;
            }

            let rest = word.split_off(room);
            lines.push(word.iter().collect());
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines.join(&format!("\n{indent}"))
}
