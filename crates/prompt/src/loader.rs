//! Prompt loader: built-in definitions plus workspace overrides.

use crate::builder::check_template;
use crate::types::PromptDefinition;
use agriclimate_core::{AppError, AppResult};
use std::path::Path;

/// Prompt that turns a question into a structured intent.
pub const INTENT_EXTRACT_PROMPT_ID: &str = "intent.extract";

/// Prompt that turns question, intent and datasets into a cited answer.
pub const ANSWER_SYNTHESIZE_PROMPT_ID: &str = "answer.synthesize";

const BUILTIN_PROMPTS: [(&str, &str); 2] = [
    (
        INTENT_EXTRACT_PROMPT_ID,
        include_str!("../prompts/intent.extract.yml"),
    ),
    (
        ANSWER_SYNTHESIZE_PROMPT_ID,
        include_str!("../prompts/answer.synthesize.yml"),
    ),
];

/// Load a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> AppResult<PromptDefinition> {
    let (_, source) = BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Unknown built-in prompt: {}", prompt_id)))?;

    parse_prompt(source, prompt_id)
}

/// Load a prompt definition, preferring a workspace override.
///
/// Looks for `<workspace>/.agriclimate/prompts/<id>.yml` first and falls
/// back to the built-in definition.
///
/// # Example
/// ```no_run
/// use agriclimate_prompt::{load_prompt, ANSWER_SYNTHESIZE_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), ANSWER_SYNTHESIZE_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(".agriclimate/prompts")
        .join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() {
        tracing::debug!("No override at {:?}, using built-in prompt", prompt_file);
        return builtin_prompt(prompt_id);
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}', expected '{}'",
            prompt_file, definition.id, prompt_id
        )));
    }

    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);

    Ok(definition)
}

fn parse_prompt(source: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(source)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    check_template(&def.template)?;
    if let Some(system) = &def.system {
        check_template(system)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_override(dir: &Path, id: &str, content: &str) -> PathBuf {
        let prompts_dir = dir.join(".agriclimate/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_builtin_prompts_are_valid() {
        let extract = builtin_prompt(INTENT_EXTRACT_PROMPT_ID).unwrap();
        assert_eq!(extract.output.format, OutputFormat::Json);
        assert_eq!(extract.generation.temperature, Some(0.1));
        assert!(extract.template.contains("{{question}}"));

        let synth = builtin_prompt(ANSWER_SYNTHESIZE_PROMPT_ID).unwrap();
        assert_eq!(synth.output.format, OutputFormat::Text);
        assert_eq!(synth.generation.max_tokens, Some(1500));
        assert!(synth.template.contains("[Dataset N]"));
        assert!(synth.template.contains("Sources"));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(builtin_prompt("nope").is_err());
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), INTENT_EXTRACT_PROMPT_ID).unwrap();
        assert_eq!(prompt.id, INTENT_EXTRACT_PROMPT_ID);
    }

    #[test]
    fn test_load_override() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            ANSWER_SYNTHESIZE_PROMPT_ID,
            r#"
id: answer.synthesize
title: "Short answers"
apiVersion: "1.1"
template: "Answer briefly: {{question}}"
output:
  format: text
"#,
        );

        let prompt = load_prompt(temp_dir.path(), ANSWER_SYNTHESIZE_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Short answers");
        assert_eq!(prompt.generation.max_tokens, None);
    }

    #[test]
    fn test_override_with_wrong_id() {
        let temp_dir = TempDir::new().unwrap();
        write_override(
            temp_dir.path(),
            INTENT_EXTRACT_PROMPT_ID,
            r#"
id: something.else
title: "Mismatch"
apiVersion: "1.0"
template: "{{question}}"
output:
  format: json
"#,
        );

        assert!(load_prompt(temp_dir.path(), INTENT_EXTRACT_PROMPT_ID).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), INTENT_EXTRACT_PROMPT_ID, "invalid: yaml: content:");

        assert!(load_prompt(temp_dir.path(), INTENT_EXTRACT_PROMPT_ID).is_err());
    }

    #[test]
    fn test_invalid_api_version() {
        let result = parse_prompt(
            r#"
id: x
title: "X"
apiVersion: "1"
template: "{{question}}"
output:
  format: text
"#,
            "inline",
        );
        assert!(result.is_err());
    }
}
