//! Shared fixtures: a canonical kit on disk plus a descriptor set whose
//! scopes and config dirs live inside a temp directory.

use std::path::{Path, PathBuf};

pub struct Fixture {
    pub kit: PathBuf,
    pub claude_config: PathBuf,
    pub plugin_root: PathBuf,
    pub cursor_root: PathBuf,
    pub state: PathBuf,
    pub descriptors_path: PathBuf,
    pub descriptors_yaml: String,
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Write the canonical kit used across the scenarios: one agent, one
/// skill, one command, one rule, hook documents for both tools, and an
/// MCP config with a relative script path.
pub fn write_kit(root: &Path) {
    write_file(
        root,
        "brain.config.json",
        r#"{
  "tools": ["claude-code", "cursor"],
  "agents": {
    "architect": { "color": "blue" }
  }
}
"#,
    );
    write_file(
        root,
        "agents/architect.md",
        "---\ndescription: Designs systems before code is written\nmodel: opus\ninternal_notes: dropped by every tool\n---\n\nYou are the architect agent.\n",
    );
    write_file(root, "skills/my-skill/SKILL.md", "# My Skill\n\nDo the thing.\n");
    write_file(root, "commands/deploy.md", "Deploy the current branch.\n");
    write_file(
        root,
        "protocols/TEST.md",
        "---\ndescription: Testing protocol\n---\n\nAlways write tests first.\n",
    );
    write_file(
        root,
        "hooks/claude-code.json",
        "{\n  \"hooks\": {\n    \"SessionStart\": [{ \"command\": \"echo session\" }]\n  }\n}\n",
    );
    write_file(
        root,
        "hooks/cursor.json",
        "{\n  \"brainHook\": { \"event\": \"session-start\" }\n}\n",
    );
    write_file(
        root,
        "configs/mcp.json",
        "{\n  \"mcpServers\": {\n    \"brain-memory\": {\n      \"command\": \"python3\",\n      \"args\": [\"scripts/memory_server.py\"]\n    }\n  }\n}\n",
    );
    write_file(root, "scripts/memory_server.py", "print('memory')\n");
}

/// Build the standard two-tool fixture under `tmp`.
pub fn fixture(tmp: &Path) -> Fixture {
    let kit = tmp.join("kit");
    write_kit(&kit);

    let claude_config = tmp.join("claude-config");
    let plugin_root = tmp.join("plugin-root");
    let cursor_root = tmp.join("cursor-config");
    let state = tmp.join("state");

    let descriptors_yaml = format!(
        r#"tools:
  claude-code:
    displayName: Claude Code
    prefix: false
    configDir: {claude_config}
    scopes:
      plugin: {plugin_root}
    defaultScope: plugin
    agents:
      frontmatter: [name, description, model, color, tools]
    rules:
      extension: .md
    hooks:
      strategy: direct
      target: hooks/hooks.json
    mcp:
      strategy: direct
      target: .mcp.json
    manifest:
      type: marketplace
    detection:
      type: json_key
      file: plugins/known_marketplaces.json
      key: brain
    placement: marketplace

  cursor:
    displayName: Cursor
    prefix: true
    configDir: {cursor_root}
    scopes:
      global: {cursor_root}
    defaultScope: global
    agents:
      frontmatter: [name, description]
    rules:
      extension: .mdc
      extraFrontmatter:
        alwaysApply: true
    hooks:
      strategy: merge
      target: hooks.json
    mcp:
      strategy: merge
      target: mcp.json
    manifest:
      type: file_list
    detection:
      type: prefix_scan
      dirs: [agents, rules, commands]
    placement: copy_and_merge
"#,
        claude_config = claude_config.display(),
        plugin_root = plugin_root.display(),
        cursor_root = cursor_root.display(),
    );

    let descriptors_path = tmp.join("tools.yaml");
    std::fs::write(&descriptors_path, &descriptors_yaml).unwrap();

    Fixture {
        kit,
        claude_config,
        plugin_root,
        cursor_root,
        state,
        descriptors_path,
        descriptors_yaml,
    }
}
