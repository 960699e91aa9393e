//! System prompt templating.
//!
//! The built-in prompt text lives in one template file; the enabled tool names
//! and optional operator instructions are filled in at startup.

use std::collections::BTreeMap;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("templates/system_prompt.template");

/// Parameters used to compile the system prompt template.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SystemPromptParams<'a> {
    pub enabled_tools: Vec<&'a str>,
    pub custom_instructions: Option<&'a str>,
}

/// Render the system prompt template using runtime parameters.
pub fn render_system_prompt(params: SystemPromptParams<'_>) -> String {
    let mut vars = BTreeMap::<&str, String>::new();
    vars.insert(
        "ENABLED_TOOLS_LIST",
        render_enabled_tools(&params.enabled_tools),
    );
    vars.insert(
        "CUSTOM_INSTRUCTIONS_BLOCK",
        render_custom_instructions(params.custom_instructions),
    );
    normalize_blank_lines(&render_template(SYSTEM_PROMPT_TEMPLATE, &vars))
}

fn render_template(template: &str, vars: &BTreeMap<&str, String>) -> String {
    vars.iter().fold(template.to_string(), |rendered, (key, value)| {
        rendered.replace(&format!("{{{{{key}}}}}"), value)
    })
}

fn render_enabled_tools(enabled_tools: &[&str]) -> String {
    if enabled_tools.is_empty() {
        return "- none (answer from your own knowledge)".to_string();
    }
    enabled_tools
        .iter()
        .map(|name| format!("- `{name}`"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_custom_instructions(custom: Option<&str>) -> String {
    match custom.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => format!("Additional operator instructions:\n{custom}"),
        None => String::new(),
    }
}

/// Collapse runs of blank lines and trim trailing whitespace.
fn normalize_blank_lines(text: &str) -> String {
    let mut out = String::new();
    let mut previous_blank = false;
    for line in text.lines() {
        let is_blank = line.trim().is_empty();
        if is_blank && previous_blank {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
        previous_blank = is_blank;
    }
    out.trim().to_string()
}
