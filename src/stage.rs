use crate::{
    error::Result, prompt::PromptTemplate, types::PipelineContext, PipelineError,
};
use serde::Serialize;

/// Persona the agent executing a stage is asked to adopt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// A single stage in the pipeline.
///
/// All text fields are fully interpolated; a `Stage` can only be obtained
/// through [`StageBuilder::build`], which renders and validates them.
#[derive(Debug, Clone, Serialize)]
pub struct Stage {
    /// Name of the stage (for logging/progress and dependency wiring).
    pub name: String,

    /// Display label shown in progress messages.
    pub label: String,

    /// Position in the pipeline, assigned when the stage is added.
    pub ordinal: usize,

    pub agent: AgentProfile,

    /// Task instructions.
    pub description: String,

    /// Description of the output shape the stage must produce.
    pub expected_output: String,

    /// Names of earlier stages whose output this stage reads.
    pub depends_on: Vec<String>,

    /// Per-stage model override.
    pub model: Option<String>,

    /// Per-stage temperature override.
    pub temperature: Option<f64>,
}

/// Builder for creating stages with validation.
#[derive(Debug, Clone)]
pub struct StageBuilder {
    name: String,
    label: Option<String>,
    role: PromptTemplate,
    goal: PromptTemplate,
    backstory: PromptTemplate,
    description: PromptTemplate,
    expected_output: PromptTemplate,
    depends_on: Vec<String>,
    model: Option<String>,
    temperature: Option<f64>,
}

impl StageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            role: PromptTemplate::new(""),
            goal: PromptTemplate::new(""),
            backstory: PromptTemplate::new(""),
            description: PromptTemplate::new(""),
            expected_output: PromptTemplate::new(""),
            depends_on: Vec::new(),
            model: None,
            temperature: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn role(mut self, template: impl Into<String>) -> Self {
        self.role = PromptTemplate::new(template);
        self
    }

    pub fn goal(mut self, template: impl Into<String>) -> Self {
        self.goal = PromptTemplate::new(template);
        self
    }

    pub fn backstory(mut self, template: impl Into<String>) -> Self {
        self.backstory = PromptTemplate::new(template);
        self
    }

    pub fn description(mut self, template: impl Into<String>) -> Self {
        self.description = PromptTemplate::new(template);
        self
    }

    pub fn expected_output(mut self, template: impl Into<String>) -> Self {
        self.expected_output = PromptTemplate::new(template);
        self
    }

    /// Declare an upstream stage this stage reads from.
    pub fn depends_on(mut self, stage: impl Into<String>) -> Self {
        self.depends_on.push(stage.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Render every template against `context` and produce the stage.
    ///
    /// Fails when the name, role, description or expected output is empty,
    /// or when a template references a parameter `context` does not hold.
    pub fn build(self, context: &PipelineContext) -> Result<Stage> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Stage name cannot be empty".to_string(),
            ));
        }
        for (field, template) in [
            ("role", &self.role),
            ("description", &self.description),
            ("expected output", &self.expected_output),
        ] {
            if template.is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "Stage '{}' has an empty {}",
                    self.name, field
                )));
            }
        }

        let render = |template: &PromptTemplate| {
            template.render(context).map_err(|e| {
                PipelineError::InvalidConfig(format!("Stage '{}': {}", self.name, e))
            })
        };

        let agent = AgentProfile {
            role: render(&self.role)?,
            goal: render(&self.goal)?,
            backstory: render(&self.backstory)?,
        };
        let description = render(&self.description)?;
        let expected_output = render(&self.expected_output)?;

        Ok(Stage {
            label: self.label.clone().unwrap_or_else(|| self.name.clone()),
            name: self.name,
            ordinal: 0,
            agent,
            description,
            expected_output,
            depends_on: self.depends_on,
            model: self.model,
            temperature: self.temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(name: &str) -> StageBuilder {
        StageBuilder::new(name)
            .role("Writer")
            .description("Write about {theme}")
            .expected_output("Text about {theme}")
    }

    #[test]
    fn test_stage_builder_success() {
        let ctx = PipelineContext::new().insert("theme", "Oceans");
        let stage = minimal("write")
            .label("Writing")
            .goal("Cover {theme} well")
            .backstory("You love {theme}.")
            .depends_on("plan")
            .model("my-model")
            .temperature(0.5)
            .build(&ctx)
            .unwrap();

        assert_eq!(stage.name, "write");
        assert_eq!(stage.label, "Writing");
        assert_eq!(stage.description, "Write about Oceans");
        assert_eq!(stage.expected_output, "Text about Oceans");
        assert_eq!(stage.agent.goal, "Cover Oceans well");
        assert_eq!(stage.agent.backstory, "You love Oceans.");
        assert_eq!(stage.depends_on, vec!["plan".to_string()]);
        assert_eq!(stage.model.as_deref(), Some("my-model"));
        assert_eq!(stage.temperature, Some(0.5));
    }

    #[test]
    fn test_label_defaults_to_name() {
        let ctx = PipelineContext::new().insert("theme", "x");
        let stage = minimal("plan").build(&ctx).unwrap();
        assert_eq!(stage.label, "plan");
    }

    #[test]
    fn test_stage_builder_empty_description_fails() {
        let result = StageBuilder::new("test")
            .role("r")
            .expected_output("o")
            .build(&PipelineContext::new());
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_stage_builder_empty_name_fails() {
        let result = minimal("  ").build(&PipelineContext::new().insert("theme", "x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_parameter_names_stage() {
        let err = minimal("research").build(&PipelineContext::new()).unwrap_err();
        match err {
            PipelineError::InvalidConfig(msg) => {
                assert!(msg.contains("research"));
                assert!(msg.contains("{theme}"));
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }
}
