//! Template document tree and YAML emitter
//!
//! Templates are not valid YAML until Helm renders them: numeric fields hold
//! bare `{{ ... }}` expressions and some sections are guarded by `{{- if }}`
//! blocks. [`Node`] models both explicitly so the emitter never has to patch
//! serialized text.

use std::collections::BTreeMap;

use serde_json::{Number, Value as JsonValue};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Template expression emitted verbatim, without quotes
    Expr(String),
    Seq(Vec<Node>),
    Map(BTreeMap<String, Node>),
    /// Pre-rendered lines, indented relative to the key that owns them
    Block(Vec<String>),
}

impl From<JsonValue> for Node {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Node::Null,
            JsonValue::Bool(b) => Node::Bool(b),
            JsonValue::Number(n) => Node::Number(n),
            JsonValue::String(s) => Node::String(s),
            JsonValue::Array(items) => Node::Seq(items.into_iter().map(Node::from).collect()),
            JsonValue::Object(map) => Node::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Node::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Node {
    pub fn as_map_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Walk a path of map keys
    pub fn pointer_mut(&mut self, path: &[&str]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, key| node.as_map_mut()?.get_mut(*key))
    }

    /// Serialize the tree as block-style YAML
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = self.lines()?.join("\n");
        out.push('\n');
        Ok(out)
    }

    /// Lines of the block-style rendering, without trailing newline
    pub(crate) fn lines(&self) -> Result<Vec<String>> {
        match self {
            Node::Map(map) if !map.is_empty() => {
                let mut out = Vec::new();
                for (key, value) in map {
                    let key = quote(key)?;
                    match value {
                        Node::Map(child) if !child.is_empty() => {
                            out.push(format!("{}:", key));
                            out.extend(value.lines()?.iter().map(|line| indent(line, 2)));
                        }
                        // sequences stay at the indentation of their key
                        Node::Seq(items) if !items.is_empty() => {
                            out.push(format!("{}:", key));
                            out.extend(value.lines()?);
                        }
                        Node::Block(block) => {
                            out.push(format!("{}:", key));
                            out.extend(block.iter().cloned());
                        }
                        scalar => out.push(format!("{}: {}", key, scalar.inline()?)),
                    }
                }
                Ok(out)
            }
            Node::Seq(items) if !items.is_empty() => {
                let mut out = Vec::new();
                for item in items {
                    match item {
                        Node::Map(child) if !child.is_empty() => push_item(&mut out, item.lines()?),
                        Node::Seq(child) if !child.is_empty() => push_item(&mut out, item.lines()?),
                        Node::Block(block) => push_item(&mut out, block.clone()),
                        scalar => out.push(format!("- {}", scalar.inline()?)),
                    }
                }
                Ok(out)
            }
            Node::Block(block) => Ok(block.clone()),
            scalar => Ok(vec![scalar.inline()?]),
        }
    }

    fn inline(&self) -> Result<String> {
        Ok(match self {
            Node::Null => "null".to_string(),
            Node::Bool(b) => b.to_string(),
            Node::Number(n) => n.to_string(),
            Node::String(s) => quote(s)?,
            Node::Expr(expr) => expr.clone(),
            Node::Map(_) => "{}".to_string(),
            Node::Seq(_) => "[]".to_string(),
            Node::Block(block) => block.join(" "),
        })
    }
}

fn push_item(out: &mut Vec<String>, lines: Vec<String>) {
    for (i, line) in lines.into_iter().enumerate() {
        if i == 0 {
            out.push(format!("- {}", line));
        } else {
            out.push(indent(&line, 2));
        }
    }
}

fn indent(line: &str, width: usize) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{:width$}{}", "", line, width = width)
    }
}

/// Render a string scalar on a single line, quoting only when YAML needs it
pub(crate) fn quote(s: &str) -> Result<String> {
    if !s.contains(['\n', '\r']) {
        let rendered = serde_yaml::to_string(s)?;
        let rendered = rendered.trim_end_matches('\n');
        if !rendered.contains('\n') {
            return Ok(rendered.to_string());
        }
    }
    // a JSON string is a valid double-quoted YAML scalar
    Ok(serde_json::to_string(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn yaml(value: JsonValue) -> String {
        Node::from(value).to_yaml().unwrap()
    }

    #[test]
    fn test_nested_maps_and_sequences() {
        let out = yaml(json!({
            "spec": {
                "containers": [
                    {"name": "web", "ports": [{"containerPort": 80}]}
                ],
                "replicas": 2
            },
            "kind": "Deployment"
        }));

        assert_eq!(
            out,
            "kind: Deployment\n\
             spec:\n\
             \x20 containers:\n\
             \x20 - name: web\n\
             \x20   ports:\n\
             \x20   - containerPort: 80\n\
             \x20 replicas: 2\n"
        );
    }

    #[test]
    fn test_scalars_are_quoted_when_needed() {
        let out = yaml(json!({
            "name": "{{ template \"fullname\" . }}-web",
            "tag": "1.14",
            "flag": "true",
            "plain": "nginx",
            "empty": {},
            "list": []
        }));

        assert!(out.contains("name: '{{ template \"fullname\" . }}-web'\n"), "{}", out);
        assert!(out.contains("tag: '1.14'\n"), "{}", out);
        assert!(out.contains("flag: 'true'\n"), "{}", out);
        assert!(out.contains("plain: nginx\n"));
        assert!(out.contains("empty: {}\n"));
        assert!(out.contains("list: []\n"));
    }

    #[test]
    fn test_multiline_strings_stay_on_one_line() {
        let out = yaml(json!({"script": "echo a\necho b"}));
        assert_eq!(out, "script: \"echo a\\necho b\"\n");
        let back: JsonValue = serde_yaml::from_str(&out).unwrap();
        assert_eq!(back["script"], "echo a\necho b");
    }

    #[test]
    fn test_expression_is_not_quoted() {
        let mut node = Node::from(json!({"spec": {"replicas": 3}}));
        *node.pointer_mut(&["spec", "replicas"]).unwrap() =
            Node::Expr("{{.Values.web.replicas}}".to_string());

        assert_eq!(
            node.to_yaml().unwrap(),
            "spec:\n  replicas: {{.Values.web.replicas}}\n"
        );
    }

    #[test]
    fn test_block_is_spliced_at_depth() {
        let mut node = Node::from(json!({"spec": {"restartPolicy": "Always"}}));
        node.pointer_mut(&["spec"])
            .and_then(Node::as_map_mut)
            .unwrap()
            .insert(
                "volumes".to_string(),
                Node::Block(vec![
                    "- name: data".to_string(),
                    "{{- if .Values.persistence.data.enabled }}".to_string(),
                    "  nfs:".to_string(),
                    "    path: /exports".to_string(),
                ]),
            );

        assert_eq!(
            node.to_yaml().unwrap(),
            "spec:\n  restartPolicy: Always\n  volumes:\n  - name: data\n  \
             {{- if .Values.persistence.data.enabled }}\n    nfs:\n      path: /exports\n"
        );
    }

    #[test]
    fn test_output_parses_back() {
        let value = json!({
            "metadata": {"labels": {"app.kubernetes.io/name": "web", "tier": "front end"}},
            "data": {"key": "value: with colon", "hash": "a # b"},
            "args": ["--port", "8080", ""],
            "nested": [[1, 2], [3]]
        });
        let back: JsonValue = serde_yaml::from_str(&yaml(value.clone())).unwrap();
        assert_eq!(back, value);
    }
}
