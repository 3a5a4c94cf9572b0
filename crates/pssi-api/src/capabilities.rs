use pssi_ai::{Persona, ProviderKind};
use serde_json::{Map, Value};

/// One request field a capability reads into its prompt.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: &'static str,
    /// Message returned when the field is missing; `None` means optional.
    pub required: Option<&'static str>,
}

const fn optional(name: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default,
        required: None,
    }
}

const fn required(name: &'static str, message: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: "",
        required: Some(message),
    }
}

/// A persona-driven capability executed by the generic capability flow.
#[derive(Debug, Clone, Copy)]
pub struct CapabilitySpec {
    pub name: &'static str,
    pub persona: Persona,
    pub fields: &'static [FieldSpec],
    /// `{field}` placeholders are filled from the request.
    pub prompt_template: &'static str,
    /// Tried in order; the first with a credential is used.
    pub providers: &'static [ProviderKind],
    pub temperature: f32,
    pub max_tokens: u32,
    /// Where non-JSON answers are placed.
    pub fallback_field: &'static str,
    pub platform: Option<&'static str>,
}

pub const CAPABILITIES: &[CapabilitySpec] = &[
    CapabilitySpec {
        name: "system-optimizer",
        persona: Persona::SystemOptimizer,
        fields: &[optional("platform", "auto"), optional("action", "optimize")],
        prompt_template: "Platform: {platform}\nAction: {action}\n\
Provide system optimizations as JSON: { \"optimizations\": [{\"category\": string, \"action\": string, \
\"impact\": string, \"safe\": boolean}], \"estimatedImprovement\": string }",
        providers: &[ProviderKind::OpenAI],
        temperature: 0.3,
        max_tokens: 2000,
        fallback_field: "guide",
        platform: None,
    },
    CapabilitySpec {
        name: "ios-optimizer",
        persona: Persona::IosOptimizer,
        fields: &[optional("action", "optimize"), optional("device", "iPhone")],
        prompt_template: "Device: {device}\nAction: {action}",
        providers: &[ProviderKind::OpenAI],
        temperature: 0.3,
        max_tokens: 2000,
        fallback_field: "guide",
        platform: Some("ios"),
    },
    CapabilitySpec {
        name: "browser-optimizer",
        persona: Persona::BrowserOptimizer,
        fields: &[optional("browser", "chrome"), optional("action", "optimize")],
        prompt_template: "Browser: {browser}\nAction: {action}",
        providers: &[ProviderKind::OpenAI],
        temperature: 0.3,
        max_tokens: 2000,
        fallback_field: "guide",
        platform: Some("browser"),
    },
    CapabilitySpec {
        name: "console-optimizer",
        persona: Persona::ConsoleOptimizer,
        fields: &[optional("console", "playstation"), optional("action", "optimize")],
        prompt_template: "Console: {console}\nAction: {action}",
        providers: &[ProviderKind::OpenAI],
        temperature: 0.3,
        max_tokens: 2000,
        fallback_field: "guide",
        platform: Some("console"),
    },
    CapabilitySpec {
        name: "code-analyzer",
        persona: Persona::CodeAnalyzer,
        fields: &[
            required("code", "Code is required"),
            optional("filepath", "unknown"),
            optional("action", "analyze"),
        ],
        prompt_template: "Action: {action}\nFile: {filepath}\n\n```\n{code}\n```",
        providers: &[ProviderKind::OpenAI, ProviderKind::Anthropic],
        temperature: 0.3,
        max_tokens: 4000,
        fallback_field: "response",
        platform: None,
    },
];

pub fn find(name: &str) -> Option<&'static CapabilitySpec> {
    CAPABILITIES.iter().find(|c| c.name == name)
}

impl CapabilitySpec {
    /// Required fields in extractor form.
    pub fn required(&self) -> Vec<(&'static str, &'static str)> {
        self.fields
            .iter()
            .filter_map(|f| f.required.map(|message| (f.name, message)))
            .collect()
    }

    pub fn render(&self, input: &Map<String, Value>) -> String {
        self.fields
            .iter()
            .fold(self.prompt_template.to_string(), |prompt, field| {
                let value = match input.get(field.name) {
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(Value::Null) | None => field.default.to_string(),
                    Some(Value::String(_)) => field.default.to_string(),
                    Some(other) => other.to_string(),
                };
                prompt.replace(&format!("{{{}}}", field.name), &value)
            })
    }

    /// Shape the provider's answer. JSON objects are merged into the
    /// response; anything else is returned verbatim under the fallback field.
    pub fn map_response(&self, provider: ProviderKind, model: &str, content: &str) -> Map<String, Value> {
        let mut response = Map::new();
        response.insert("success".to_string(), Value::Bool(true));
        response.insert("capability".to_string(), Value::String(self.name.to_string()));
        response.insert("provider".to_string(), Value::String(provider.to_string()));
        response.insert("model".to_string(), Value::String(model.to_string()));
        if let Some(platform) = self.platform {
            response.insert("platform".to_string(), Value::String(platform.to_string()));
        }

        match parse_json_object(content) {
            Some(data) => response.extend(data),
            None => {
                response.insert(
                    self.fallback_field.to_string(),
                    Value::String(content.to_string()),
                );
            }
        }
        response
    }
}

/// Parse `content` as a JSON object, tolerating a surrounding code fence.
pub fn parse_json_object(content: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_fence(content)) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = CAPABILITIES.iter().map(|c| c.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CAPABILITIES.len());
    }

    #[test]
    fn test_code_analyzer_requires_code() {
        let spec = find("code-analyzer").unwrap();
        assert_eq!(spec.required(), vec![("code", "Code is required")]);
        assert!(find("system-optimizer").unwrap().required().is_empty());
        assert!(find("unknown").is_none());
    }

    #[test]
    fn test_render_uses_defaults() {
        let spec = find("system-optimizer").unwrap();
        let prompt = spec.render(&object(json!({"platform": "linux"})));

        assert!(prompt.starts_with("Platform: linux\nAction: optimize\n"));
    }

    #[test]
    fn test_render_fills_code() {
        let spec = find("code-analyzer").unwrap();
        let prompt = spec.render(&object(json!({"code": "let x = 1;", "filepath": "main.rs"})));

        assert_eq!(prompt, "Action: analyze\nFile: main.rs\n\n```\nlet x = 1;\n```");
    }

    #[test]
    fn test_json_answer_is_merged() {
        let spec = find("ios-optimizer").unwrap();
        let response = spec.map_response(
            ProviderKind::OpenAI,
            "gpt-4o",
            r#"{"tips":["Disable background refresh"],"estimatedImprovement":"20%"}"#,
        );

        assert_eq!(response["platform"], "ios");
        assert_eq!(response["estimatedImprovement"], "20%");
        assert!(response.get("guide").is_none());
    }

    #[test]
    fn test_fenced_json_is_merged() {
        let spec = find("code-analyzer").unwrap();
        let response = spec.map_response(
            ProviderKind::Anthropic,
            "claude-3-5-sonnet-20241022",
            "```json\n{\"summary\":\"clean\",\"score\":95}\n```",
        );

        assert_eq!(response["summary"], "clean");
        assert_eq!(response["score"], 95);
    }

    #[test]
    fn test_prose_answer_falls_back_verbatim() {
        let raw = "  Turn off animations.\nThen restart.  ";

        let optimizer = find("browser-optimizer").unwrap().map_response(ProviderKind::OpenAI, "gpt-4o", raw);
        assert_eq!(optimizer["guide"], raw);
        assert_eq!(optimizer["success"], true);

        let analyzer = find("code-analyzer").unwrap().map_response(ProviderKind::OpenAI, "gpt-4o", raw);
        assert_eq!(analyzer["response"], raw);
    }

    #[test]
    fn test_json_array_is_not_merged() {
        let spec = find("system-optimizer").unwrap();
        let response = spec.map_response(ProviderKind::OpenAI, "gpt-4o", "[1,2,3]");
        assert_eq!(response["guide"], "[1,2,3]");
    }
}
