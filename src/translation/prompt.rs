use crate::utils::{GlossaryTerm, TranslationSessionConfig};

/// System instruction sent with every batch.
///
/// A non-blank `system_prompt` in the config is used verbatim; otherwise the
/// instruction is assembled from the languages, the glossary and the delimiter.
pub fn build_system_prompt(config: &TranslationSessionConfig) -> String {
    if let Some(custom) = config.system_prompt.as_deref() {
        if !custom.trim().is_empty() {
            return custom.to_string();
        }
    }

    let mut prompt = format!(
        "Translate the {} text in the given input into {}.",
        config.source_lang, config.target_lang
    );

    if !config.glossary.is_empty() {
        prompt.push_str("\n\nTerminology (always use these translations):\n");
        prompt.push_str(&render_glossary(&config.glossary));
    }

    prompt.push_str("\nOutput requirements:\n");
    prompt.push_str("1. Do not change any formatting or symbols of the input text\n");
    prompt.push_str("2. Return only the translation, with no explanations or extra content\n");
    prompt.push_str("3. Keep the paragraph structure of the original text\n");
    prompt.push_str(&format!(
        "4. The input is a list of segments separated by the marker {:?}; keep every marker exactly where it is\n",
        config.delimiter
    ));

    prompt
}

pub fn render_glossary(glossary: &[GlossaryTerm]) -> String {
    glossary
        .iter()
        .enumerate()
        .map(|(i, term)| format!("{}) {}: {}\n", i + 1, term.source, term.target))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_has_glossary_and_rules() {
        let config = TranslationSessionConfig::default();
        let prompt = build_system_prompt(&config);

        assert!(prompt.starts_with("Translate the Chinese text in the given input into English."));
        assert!(prompt.contains("1) 票: invoice"));
        assert!(prompt.contains("数电票: fully digitized e-invoice"));
        assert!(prompt.contains("Return only the translation"));
        assert!(prompt.contains("\"\\n🚀\""));
    }

    #[test]
    fn test_custom_prompt_overrides() {
        let config = TranslationSessionConfig {
            system_prompt: Some("将中文翻译成英文".to_string()),
            ..Default::default()
        };
        assert_eq!(build_system_prompt(&config), "将中文翻译成英文");
    }

    #[test]
    fn test_blank_custom_prompt_ignored() {
        let config = TranslationSessionConfig {
            system_prompt: Some("   ".to_string()),
            glossary: Vec::new(),
            ..Default::default()
        };
        let prompt = build_system_prompt(&config);
        assert!(!prompt.contains("Terminology"));
        assert!(prompt.contains("Output requirements"));
    }
}
