use brain_install::build::{build, MergePayload};
use brain_install::descriptor::DescriptorSet;
use brain_install::error::InstallError;
use brain_install::source::{MemorySource, TemplateSource};
use brain_install::BRAIN_PREFIX;
use std::collections::BTreeSet;

fn memory_kit() -> MemorySource {
    let mut source = MemorySource::new();
    source
        .insert(
            "brain.config.json",
            r#"{"tools": ["claude-code", "cursor"], "agents": {"architect": {"color": "blue"}}}"#,
        )
        .insert(
            "agents/architect.md",
            "---\ndescription: Designs systems\nmodel: opus\n---\n\nYou are the architect.\n",
        )
        .insert("skills/my-skill/SKILL.md", "# Skill\n")
        .insert("skills/my-skill/scripts/helper.py", "print('hi')\n")
        .insert("commands/deploy.md", "Deploy.\n")
        .insert("protocols/TEST.md", "Always test.\n")
        .insert("protocols/AGENTS.md", "Agent routing table.\n")
        .insert(
            "hooks/claude-code.json",
            r#"{"hooks": {"SessionStart": []}}"#,
        )
        .insert("hooks/cursor.json", r#"{"brainHook": {"event": "start"}}"#)
        .insert("hooks/scripts/session.sh", "#!/bin/sh\n")
        .insert(
            "configs/mcp.json",
            r#"{"mcpServers": {"brain-memory": {"command": "python3", "args": ["scripts/server.py"]}}}"#,
        )
        .insert("scripts/server.py", "print('mcp')\n");
    source
}

#[test]
fn test_generated_paths_are_unique() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let config = source.config().unwrap();

    for name in set.names() {
        let tool = set.get(&name).unwrap();
        let output = build(&source, &tool, &config).unwrap();
        let paths: Vec<_> = output
            .all_files()
            .iter()
            .map(|f| f.relative_path.clone())
            .collect();
        let unique: BTreeSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len(), "duplicate path for {}", name);
    }
}

#[test]
fn test_prefix_law() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let config = source.config().unwrap();

    let cursor = set.get("cursor").unwrap();
    let output = build(&source, &cursor, &config).unwrap();
    for file in output
        .agents
        .iter()
        .chain(&output.skills)
        .chain(&output.commands)
    {
        let after_category = file.relative_path.split_once('/').unwrap().1;
        assert!(
            after_category.starts_with(BRAIN_PREFIX),
            "unprefixed: {}",
            file.relative_path
        );
    }
    // Rules carry the prefix too, except routed documents.
    for file in &output.rules {
        if let Some(rest) = file.relative_path.strip_prefix("rules/") {
            assert!(rest.starts_with(BRAIN_PREFIX), "unprefixed rule: {}", rest);
        }
    }

    let claude = set.get("claude-code").unwrap();
    let output = build(&source, &claude, &config).unwrap();
    for file in output.all_files() {
        assert!(
            !file.relative_path.contains(BRAIN_PREFIX),
            "unexpected prefix: {}",
            file.relative_path
        );
    }
}

#[test]
fn test_routed_rule_keeps_extension_and_name() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let cursor = set.get("cursor").unwrap();
    let config = source.config().unwrap();

    let output = build(&source, &cursor, &config).unwrap();
    let routed = output
        .rules
        .iter()
        .find(|f| f.relative_path == "AGENTS.md")
        .expect("routed rule lands at the tool root");
    let text = String::from_utf8(routed.content.clone()).unwrap();
    assert!(text.contains("Agent routing table."));

    // The unrouted rule takes the cursor extension and prefix.
    assert!(output
        .rules
        .iter()
        .any(|f| f.relative_path == format!("rules/{}-TEST.mdc", BRAIN_PREFIX)));
}

#[test]
fn test_merge_sidecars_and_managed_keys() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let cursor = set.get("cursor").unwrap();
    let config = source.config().unwrap();

    let output = build(&source, &cursor, &config).unwrap();

    let hooks_sidecar = output
        .hooks
        .iter()
        .find(|f| f.relative_path == "hooks.merge.json")
        .expect("hooks sidecar");
    let payload: MergePayload = serde_json::from_slice(&hooks_sidecar.content).unwrap();
    assert_eq!(payload.managed_keys, vec!["brainHook".to_string()]);
    assert_eq!(payload.content["brainHook"]["event"], "start");

    let mcp_sidecar = output
        .mcp
        .iter()
        .find(|f| f.relative_path == "mcp.merge.json")
        .expect("mcp sidecar");
    let payload: MergePayload = serde_json::from_slice(&mcp_sidecar.content).unwrap();
    assert_eq!(
        payload.managed_keys,
        vec!["mcpServers.brain-memory".to_string()]
    );
}

#[test]
fn test_hook_scripts_preserve_layout() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let config = source.config().unwrap();

    for name in set.names() {
        let tool = set.get(&name).unwrap();
        let output = build(&source, &tool, &config).unwrap();
        assert!(
            output
                .hooks
                .iter()
                .any(|f| f.relative_path == "hooks/scripts/session.sh"),
            "scripts missing for {}",
            name
        );
    }
}

#[test]
fn test_memory_source_leaves_relative_args() {
    // Without an on-disk root there is nothing to resolve against.
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let claude = set.get("claude-code").unwrap();
    let config = source.config().unwrap();

    let output = build(&source, &claude, &config).unwrap();
    let mcp = output
        .mcp
        .iter()
        .find(|f| f.relative_path == ".mcp.json")
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&mcp.content).unwrap();
    assert_eq!(
        value["mcpServers"]["brain-memory"]["args"][0],
        "scripts/server.py"
    );
}

#[test]
fn test_plugin_files_only_for_marketplace_manifests() {
    let source = memory_kit();
    let set = DescriptorSet::load_embedded().unwrap();
    let config = source.config().unwrap();

    let claude = set.get("claude-code").unwrap();
    let output = build(&source, &claude, &config).unwrap();
    let plugin_paths: Vec<_> = output
        .plugin
        .iter()
        .map(|f| f.relative_path.as_str())
        .collect();
    assert_eq!(plugin_paths, vec!["plugin.json", "marketplace.json"]);
    let plugin: serde_json::Value =
        serde_json::from_slice(&output.plugin[0].content).unwrap();
    assert_eq!(plugin["name"], "brain");

    let cursor = set.get("cursor").unwrap();
    let output = build(&source, &cursor, &config).unwrap();
    assert!(output.plugin.is_empty());
}

#[test]
fn test_missing_mandatory_hooks_source_fails() {
    let mut source = MemorySource::new();
    source.insert("configs/mcp.json", r#"{"mcpServers": {}}"#);
    let set = DescriptorSet::load_embedded().unwrap();
    let cursor = set.get("cursor").unwrap();
    let config = source.config().unwrap();

    let err = build(&source, &cursor, &config).unwrap_err();
    assert!(matches!(err, InstallError::Source(_)));
}

#[test]
fn test_hooks_strategy_none_emits_nothing() {
    let yaml = r#"tools:
  bare:
    displayName: Bare
    prefix: false
    configDir: /tmp/bare
    scopes: { global: /tmp/bare }
    defaultScope: global
    agents:
      frontmatter: [name]
    rules:
      extension: .md
    hooks: { strategy: none }
    mcp: { strategy: none }
    manifest: { type: file_list }
    detection: { type: prefix_scan, dirs: [agents] }
    placement: copy_and_merge
"#;
    let set = DescriptorSet::from_str(yaml).unwrap();
    let tool = set.get("bare").unwrap();
    let source = memory_kit();
    let config = source.config().unwrap();

    let output = build(&source, &tool, &config).unwrap();
    assert!(output.hooks.is_empty());
    assert!(output.mcp.is_empty());
}

#[test]
fn test_composable_rule_goes_through_composer() {
    let mut source = memory_kit();
    source
        .insert(
            "protocols/session/_order.yaml",
            "sections: [00-intro]\nvariants:\n  claude-code: {}\n  cursor: {}\n",
        )
        .insert("protocols/session/sections/00-intro.md", "Session rules.\n");

    let set = DescriptorSet::load_embedded().unwrap();
    let claude = set.get("claude-code").unwrap();
    let config = source.config().unwrap();

    let output = build(&source, &claude, &config).unwrap();
    let rule = output
        .rules
        .iter()
        .find(|f| f.relative_path == "rules/session.md")
        .expect("composed rule present");
    assert_eq!(String::from_utf8(rule.content.clone()).unwrap(), "Session rules.");
}
