//! @ai:module:intent Select and apply a chat template from the model identifier
//! @ai:module:layer domain
//! @ai:module:public_api TemplateRule, TemplateRegistry, select_template
//! @ai:module:stateless true

/// @ai:intent One model family: identifier substrings and its prompt wrapper
#[derive(Clone, Copy)]
pub struct TemplateRule {
    pub name: &'static str,
    /// Lowercase substrings; any match selects the rule.
    pub patterns: &'static [&'static str],
    pub format: fn(&str) -> String,
}

impl std::fmt::Debug for TemplateRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRule")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl TemplateRule {
    /// @ai:pre model_lower is already lowercased
    /// @ai:effects pure
    fn matches(&self, model_lower: &str) -> bool {
        self.patterns.iter().any(|p| model_lower.contains(p))
    }
}

fn llama3_chat(prompt: &str) -> String {
    format!(
        "<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\n{prompt}<|eot_id|><|start_header_id|>assistant<|end_header_id|>\n\n"
    )
}

fn qwen_chat(prompt: &str) -> String {
    format!("<|im_start|>user\n{prompt}<|im_end|>\n<|im_start|>assistant\n")
}

/// Built-in families in priority order.
pub const BUILTIN_RULES: &[TemplateRule] = &[
    TemplateRule {
        name: "llama3",
        patterns: &["llama-3", "llama3"],
        format: llama3_chat,
    },
    TemplateRule {
        name: "qwen",
        patterns: &["qwen"],
        format: qwen_chat,
    },
];

/// @ai:intent Ordered, immutable list of template rules; first match wins
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    rules: Vec<TemplateRule>,
}

impl TemplateRegistry {
    /// @ai:effects pure
    pub fn new(rules: Vec<TemplateRule>) -> Self {
        Self { rules }
    }

    /// @ai:intent Registry holding the built-in model families
    /// @ai:effects pure
    pub fn builtin() -> Self {
        Self::new(BUILTIN_RULES.to_vec())
    }

    /// @ai:intent Find the first rule matching a model identifier (case-insensitive)
    /// @ai:effects pure
    pub fn rule_for(&self, model: &str) -> Option<&TemplateRule> {
        let model_lower = model.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&model_lower))
    }

    /// @ai:intent Format the prompt for the model; identity when no rule matches
    /// @ai:effects pure
    pub fn apply(&self, model: &str, prompt: &str) -> String {
        match self.rule_for(model) {
            Some(rule) => (rule.format)(prompt),
            None => prompt.to_string(),
        }
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// @ai:intent Apply the built-in templates
/// @ai:effects pure
pub fn select_template(model: &str, prompt: &str) -> String {
    TemplateRegistry::builtin().apply(model, prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_llama3_template() {
        assert_eq!(
            select_template("Llama-3.1-8B.rkllm", "What is AI?"),
            "<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\nWhat is AI?<|eot_id|><|start_header_id|>assistant<|end_header_id|>\n\n"
        );
    }

    #[test]
    fn test_llama3_matches_any_case_and_spelling() {
        for model in ["LLAMA-3-8b", "meta-llama3-instruct", "my.Llama3.rkllm"] {
            let formatted = select_template(model, "tell me a joke");
            assert!(formatted.starts_with("<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\n"));
            assert!(formatted.contains("tell me a joke<|eot_id|>"));
        }
    }

    #[test]
    fn test_qwen_template() {
        assert_eq!(
            select_template("Qwen2.5-7B.rkllm", "Hi"),
            "<|im_start|>user\nHi<|im_end|>\n<|im_start|>assistant\n"
        );
        assert!(select_template("QWEN-1.8b", "a, b\n\"c\"").contains("a, b\n\"c\""));
    }

    #[test]
    fn test_unknown_model_is_identity() {
        for model in ["phi-2.rkllm", "llama-2-7b", "gemma", ""] {
            assert_eq!(select_template(model, "unchanged <prompt>"), "unchanged <prompt>");
        }
    }

    #[test]
    fn test_first_declared_rule_wins() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.rule_for("qwen-llama3-merge").unwrap().name, "llama3");

        let reordered = TemplateRegistry::new(vec![BUILTIN_RULES[1], BUILTIN_RULES[0]]);
        assert_eq!(reordered.rule_for("qwen-llama3-merge").unwrap().name, "qwen");
    }

    #[test]
    fn test_custom_rule_extends_registry() {
        fn bracket(prompt: &str) -> String {
            format!("[{prompt}]")
        }
        let mut rules = BUILTIN_RULES.to_vec();
        rules.push(TemplateRule {
            name: "bracket",
            patterns: &["phi"],
            format: bracket,
        });
        let registry = TemplateRegistry::new(rules);
        assert_eq!(registry.apply("Phi-3-mini", "hello"), "[hello]");
        assert_eq!(registry.apply("Qwen2", "hello"), qwen_chat("hello"));
    }
}
