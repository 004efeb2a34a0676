use std::fs;
use std::path::Path;

/// Build a minimal valid configuration document for one domain.
///
/// Each agent name becomes an llm-call agent with a trivial prompt, and
/// each (pattern, agent, priority) triple becomes a routing rule.
pub fn config_yaml(domain: &str, agents: &[&str], rules: &[(&str, &str, i32)]) -> String {
    let mut yaml = format!(
        r"apiVersion: switchboard.dev/v1
kind: AgentConfig
metadata:
  name: {domain}-agents
  domain: {domain}
spec:
  agents:
"
    );

    for agent in agents {
        yaml.push_str(&format!(
            "    - name: {agent}\n      type: llm-call\n      prompt_template: \"Handle: {{{{task}}}}\"\n"
        ));
    }

    if !rules.is_empty() {
        yaml.push_str("  routing:\n");
        for (pattern, agent, priority) in rules {
            yaml.push_str(&format!(
                "    - pattern: \"{pattern}\"\n      agent: {agent}\n      priority: {priority}\n"
            ));
        }
    }

    yaml
}

/// Write one YAML file per (file name, content) pair into `dir`.
pub fn write_configs(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        fs::write(dir.join(name), content).expect("failed to write config file");
    }
}
