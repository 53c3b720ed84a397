//! The build engine: `(source, descriptor, config) -> BuildOutput`.
//!
//! Pure except for reads through the `TemplateSource`. Behavioural
//! variation between tools comes exclusively from descriptor fields; there
//! is no per-tool branching here.

use super::frontmatter::{render_document, split_document, Document};
use super::output::{BuildOutput, GeneratedFile, MergePayload};
use crate::compose;
use crate::descriptor::{DeliveryStrategy, ManifestKind, ToolDescriptor};
use crate::error::{InstallError, Result};
use crate::merge::to_stable_string;
use crate::source::{BrainConfig, TemplateSource};
use crate::utils::path::{join_rel, stem};
use crate::{BRAIN_ID, BRAIN_PREFIX};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

const AGENTS_DIR: &str = "agents";
const SKILLS_DIR: &str = "skills";
const COMMANDS_DIR: &str = "commands";
const RULES_DIR: &str = "protocols";

/// Build the per-tool file set from the canonical kit.
pub fn build(
    source: &dyn TemplateSource,
    tool: &ToolDescriptor,
    config: &BrainConfig,
) -> Result<BuildOutput> {
    let output = BuildOutput {
        agents: build_agents(source, tool, config)?,
        skills: build_skills(source, tool)?,
        commands: build_commands(source, tool)?,
        rules: build_rules(source, tool)?,
        hooks: build_hooks(source, tool, config)?,
        mcp: build_mcp(source, tool, config)?,
        plugin: build_plugin(tool),
    };
    check_unique_paths(&output)?;
    Ok(output)
}

fn prefixed(tool: &ToolDescriptor, name: &str) -> String {
    if tool.prefix {
        format!("{}-{}", BRAIN_PREFIX, name)
    } else {
        name.to_string()
    }
}

fn is_empty_value(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::String(s) => s.trim().is_empty(),
        serde_yaml::Value::Sequence(s) => s.is_empty(),
        serde_yaml::Value::Mapping(m) => m.is_empty(),
        _ => false,
    }
}

/// Collect every file under `dir`, as paths relative to `dir`, sorted.
fn walk_files(source: &dyn TemplateSource, dir: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let mut pending = vec![String::new()];
    while let Some(sub) = pending.pop() {
        let rel = join_rel(dir, &sub);
        for entry in source.list_dir(&rel)? {
            let child = join_rel(&sub, &entry.name);
            if entry.is_dir {
                pending.push(child);
            } else {
                files.push(child);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn build_agents(
    source: &dyn TemplateSource,
    tool: &ToolDescriptor,
    config: &BrainConfig,
) -> Result<Vec<GeneratedFile>> {
    if !source.exists(AGENTS_DIR) {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in source.list_dir(AGENTS_DIR)? {
        if entry.is_dir || !entry.name.ends_with(".md") {
            continue;
        }
        let rel = join_rel(AGENTS_DIR, &entry.name);
        let text = source.read_to_string(&rel)?;
        let doc = split_document(&text)?;
        let agent_stem = stem(&entry.name).to_string();
        let overrides = config.agents.get(&agent_stem);

        // New frontmatter from the descriptor's whitelist, in declared
        // order; the agent's canonical stem always backs `name`.
        let mut fm = serde_yaml::Mapping::new();
        for key in &tool.agents.frontmatter {
            let value: Option<serde_yaml::Value> = if key == "name" {
                Some(agent_stem.as_str().into())
            } else if let Some(v) = overrides.and_then(|o| o.get(key)) {
                Some(v.into())
            } else {
                doc.frontmatter
                    .get(serde_yaml::Value::from(key.as_str()))
                    .cloned()
            };
            if let Some(v) = value {
                if !is_empty_value(&v) {
                    fm.insert(key.as_str().into(), v);
                }
            }
        }

        let rendered = render_document(&Document {
            frontmatter: fm,
            body: doc.body,
        })?;
        files.push(GeneratedFile::new(
            format!("agents/{}.md", prefixed(tool, &agent_stem)),
            rendered,
        ));
    }
    Ok(files)
}

fn build_skills(source: &dyn TemplateSource, tool: &ToolDescriptor) -> Result<Vec<GeneratedFile>> {
    if !source.exists(SKILLS_DIR) {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in source.list_dir(SKILLS_DIR)? {
        if !entry.is_dir {
            continue;
        }
        let skill_dir = join_rel(SKILLS_DIR, &entry.name);
        // The prefix applies to the skill directory, not the files inside.
        let dest_dir = format!("skills/{}", prefixed(tool, &entry.name));
        for inner in walk_files(source, &skill_dir)? {
            let content = source.read(&join_rel(&skill_dir, &inner))?;
            files.push(GeneratedFile::new(join_rel(&dest_dir, &inner), content));
        }
    }
    Ok(files)
}

fn build_commands(
    source: &dyn TemplateSource,
    tool: &ToolDescriptor,
) -> Result<Vec<GeneratedFile>> {
    if !source.exists(COMMANDS_DIR) {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in source.list_dir(COMMANDS_DIR)? {
        if entry.is_dir || !entry.name.ends_with(".md") {
            continue;
        }
        let content = source.read(&join_rel(COMMANDS_DIR, &entry.name))?;
        files.push(GeneratedFile::new(
            format!("commands/{}.md", prefixed(tool, stem(&entry.name))),
            content,
        ));
    }
    Ok(files)
}

fn build_rules(source: &dyn TemplateSource, tool: &ToolDescriptor) -> Result<Vec<GeneratedFile>> {
    if !source.exists(RULES_DIR) {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in source.list_dir(RULES_DIR)? {
        let rel = join_rel(RULES_DIR, &entry.name);
        let (rule_stem, text) = if entry.is_dir {
            if !compose::is_composable(source, &rel) {
                continue;
            }
            let composed = compose::compose(source, &rel, &tool.name, &BTreeMap::new())?;
            (entry.name.clone(), composed)
        } else if entry.name.ends_with(".md") {
            (stem(&entry.name).to_string(), source.read_to_string(&rel)?)
        } else {
            continue;
        };

        let mut doc = split_document(&text)?;
        // Descriptor frontmatter is the policy: extra keys win.
        for (key, value) in &tool.rules.extra_frontmatter {
            doc.frontmatter
                .insert(serde_yaml::Value::from(key.as_str()), value.clone());
        }
        let rendered = render_document(&doc)?;

        let routed = tool
            .rules
            .routing
            .get(&rule_stem)
            .filter(|dest| dest.as_str() != "rules");
        let dest = match routed {
            // Routed documents are ingested by path: original extension,
            // no prefix.
            Some(dir) if dir.is_empty() || dir == "." => format!("{}.md", rule_stem),
            Some(dir) => join_rel(dir, &format!("{}.md", rule_stem)),
            None => format!(
                "rules/{}{}",
                prefixed(tool, &rule_stem),
                tool.rules.extension
            ),
        };
        files.push(GeneratedFile::new(dest, rendered));
    }
    Ok(files)
}

fn build_hooks(
    source: &dyn TemplateSource,
    tool: &ToolDescriptor,
    config: &BrainConfig,
) -> Result<Vec<GeneratedFile>> {
    if tool.hooks.strategy == DeliveryStrategy::None {
        return Ok(Vec::new());
    }
    let hooks_rel = join_rel(&config.hooks.dir, &format!("{}.json", tool.name));
    let content = source.read(&hooks_rel)?;

    let mut files = Vec::new();
    match tool.hooks.strategy {
        DeliveryStrategy::Direct => {
            files.push(GeneratedFile::new(tool.hooks.target.clone(), content));
        }
        DeliveryStrategy::Merge => {
            let parsed: Value = serde_json::from_slice(&content)
                .map_err(|e| InstallError::Render(format!("{}: {}", hooks_rel, e)))?;
            let managed_keys = match &parsed {
                Value::Object(map) => map.keys().cloned().collect(),
                _ => Vec::new(),
            };
            let payload = MergePayload {
                managed_keys,
                content: parsed,
            };
            files.push(sidecar_file(&tool.hooks.target, &payload)?);
        }
        DeliveryStrategy::None => unreachable!(),
    }

    if source.exists(&config.hooks.scripts_dir) {
        for inner in walk_files(source, &config.hooks.scripts_dir)? {
            let rel = join_rel(&config.hooks.scripts_dir, &inner);
            files.push(GeneratedFile::new(rel.clone(), source.read(&rel)?));
        }
    }
    Ok(files)
}

fn build_mcp(
    source: &dyn TemplateSource,
    tool: &ToolDescriptor,
    config: &BrainConfig,
) -> Result<Vec<GeneratedFile>> {
    if tool.mcp.strategy == DeliveryStrategy::None {
        return Ok(Vec::new());
    }
    let mcp_rel = &config.mcp.source;
    let text = source.read_to_string(mcp_rel)?;
    let mut parsed: Value = serde_json::from_str(&text)
        .map_err(|e| InstallError::Render(format!("{}: {}", mcp_rel, e)))?;

    rewrite_relative_args(source, &mut parsed);

    let server_names: Vec<String> = parsed
        .get("mcpServers")
        .and_then(Value::as_object)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();

    let file = match tool.mcp.strategy {
        DeliveryStrategy::Direct => {
            GeneratedFile::new(tool.mcp.target.clone(), to_stable_string(&parsed))
        }
        DeliveryStrategy::Merge => {
            let payload = MergePayload {
                managed_keys: server_names
                    .iter()
                    .map(|name| format!("mcpServers.{}", name))
                    .collect(),
                content: parsed,
            };
            sidecar_file(&tool.mcp.target, &payload)?
        }
        DeliveryStrategy::None => unreachable!(),
    };
    Ok(vec![file])
}

/// Rewrite relative path arguments in server command arg vectors to
/// absolute paths under the source root. Sources without a real root leave
/// args untouched.
fn rewrite_relative_args(source: &dyn TemplateSource, config: &mut Value) {
    let Some(servers) = config.get_mut("mcpServers").and_then(Value::as_object_mut) else {
        return;
    };
    for server in servers.values_mut() {
        let Some(args) = server.get_mut("args").and_then(Value::as_array_mut) else {
            continue;
        };
        for arg in args {
            let Some(text) = arg.as_str() else { continue };
            if text.starts_with('/') || !source.exists(text) {
                continue;
            }
            if let Some(abs) = source.abs_path(text) {
                *arg = Value::String(abs.to_string_lossy().into_owned());
            }
        }
    }
}

fn build_plugin(tool: &ToolDescriptor) -> Vec<GeneratedFile> {
    match tool.manifest.kind {
        ManifestKind::FileList => Vec::new(),
        ManifestKind::Marketplace => {
            let description = "Brain agent kit";
            let plugin = json!({
                "name": BRAIN_ID,
                "description": description,
                "version": env!("CARGO_PKG_VERSION"),
            });
            let marketplace = json!({
                "name": BRAIN_ID,
                "owner": { "name": BRAIN_ID },
                "plugins": [
                    { "name": BRAIN_ID, "source": "./", "description": description }
                ],
            });
            vec![
                GeneratedFile::new("plugin.json", to_stable_string(&plugin)),
                GeneratedFile::new("marketplace.json", to_stable_string(&marketplace)),
            ]
        }
    }
}

fn sidecar_file(target: &str, payload: &MergePayload) -> Result<GeneratedFile> {
    let content = serde_json::to_value(payload)
        .map_err(|e| InstallError::Render(format!("Cannot encode merge payload: {}", e)))?;
    Ok(GeneratedFile::new(
        ToolDescriptor::sidecar_path(target),
        to_stable_string(&content),
    ))
}

fn check_unique_paths(output: &BuildOutput) -> Result<()> {
    let mut seen = BTreeSet::new();
    for file in output.all_files() {
        if !seen.insert(&file.relative_path) {
            return Err(InstallError::Render(format!(
                "Duplicate generated path: {}",
                file.relative_path
            )));
        }
    }
    Ok(())
}
