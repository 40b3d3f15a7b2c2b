//! Step-by-step cooking instructions from a recipe description

use crate::inference::{InferenceError, InferenceProvider};
use std::sync::Arc;

/// Asks the text model for ordered preparation steps
#[derive(Debug, Clone)]
pub struct RecipeInstructions {
    inference: Arc<dyn InferenceProvider>,
    instructions: String,
}

impl RecipeInstructions {
    pub fn new(inference: Arc<dyn InferenceProvider>, instructions: String) -> Self {
        Self {
            inference,
            instructions,
        }
    }

    /// Ordered step texts for `recipe_description`
    pub async fn instructions_for(&self, recipe_description: &str) -> Result<Vec<String>, InferenceError> {
        let input = format!("The recipe description is: {}", recipe_description);
        let output = self.inference.complete_text(&self.instructions, &input).await?;

        let steps = parse_steps(&output);
        if steps.is_empty() {
            return Err(InferenceError::EmptyOutput("recipe instructions".to_string()));
        }
        Ok(steps)
    }
}

/// Split model output into step texts, dropping list markers
///
/// Handles `1.`, `1)`, `Step 1:`, `-` and `*` prefixes.
pub fn parse_steps(output: &str) -> Vec<String> {
    output
        .lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let mut rest = line.trim();

    if let Some(stripped) = rest
        .strip_prefix("Step ")
        .or_else(|| rest.strip_prefix("step "))
    {
        rest = stripped;
    }

    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(stripped) = after
            .strip_prefix('.')
            .or_else(|| after.strip_prefix(')'))
            .or_else(|| after.strip_prefix(':'))
        {
            if stripped.is_empty() || stripped.starts_with(char::is_whitespace) {
                return stripped.trim();
            }
        }
    }

    if let Some(stripped) = rest.strip_prefix("- ").or_else(|| rest.strip_prefix("* ")) {
        return stripped.trim();
    }

    line.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{FakeCall, FakeInference};

    #[test]
    fn test_parse_numbered_steps() {
        let steps = parse_steps("1. Preheat oven to 180C\n2) Mix flour and eggs\n\nStep 3: Bake 20 minutes");
        assert_eq!(
            steps,
            vec!["Preheat oven to 180C", "Mix flour and eggs", "Bake 20 minutes"]
        );
    }

    #[test]
    fn test_parse_bullets_and_plain_lines() {
        let steps = parse_steps("- Chop onions\n* Fry\nServe warm");
        assert_eq!(steps, vec!["Chop onions", "Fry", "Serve warm"]);
    }

    #[test]
    fn test_number_without_marker_kept() {
        assert_eq!(parse_steps("200 g flour"), vec!["200 g flour"]);
        assert_eq!(parse_steps("1.5 cups milk"), vec!["1.5 cups milk"]);
    }

    #[tokio::test]
    async fn test_instructions_prompt() {
        let fake = Arc::new(FakeInference::new().with_text("1. Mix\n2. Bake"));
        let extractor = RecipeInstructions::new(fake.clone(), "write steps".to_string());

        let steps = extractor.instructions_for("simple bread").await.unwrap();
        assert_eq!(steps, vec!["Mix", "Bake"]);
        assert_eq!(
            fake.calls(),
            vec![FakeCall::Text {
                instructions: "write steps".to_string(),
                input: "The recipe description is: simple bread".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_error() {
        let fake = Arc::new(FakeInference::new().with_text("\n  \n"));
        let extractor = RecipeInstructions::new(fake, String::new());

        assert!(matches!(
            extractor.instructions_for("anything").await,
            Err(InferenceError::EmptyOutput(_))
        ));
    }
}
