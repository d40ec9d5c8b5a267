//! Demo: the full five-stage run against MockBackend, no API key needed.
//!
//! Run with: `cargo run --example mock_run`

use article_topics::{
    packager, pipeline, ExecCtx, FnObserver, LlmAgent, MockBackend, PipelineProgress, RunInput,
    Theme, TopicRange,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // One canned reply per stage, in pipeline order
    let mock = Arc::new(MockBackend::new(vec![
        "1. Reusable Rockets\n2. Lunar Bases\n3. Mars Sample Return\n4. Space Debris\n5. Exoplanet Surveys".into(),
        "### Research Findings\n- **Reusability:** Boosters land and fly again\n\n### Source Links\n1. https://www.nasa.gov/".into(),
        "### Condensed Information Points\n- **Reusability:** Cheaper access to orbit".into(),
        "### Resources Used\n1. https://www.nasa.gov/".into(),
        "## Topic 1: Reusable Rockets\n\n### Condensed Information Points\n- **Reusability:** Cheaper access to orbit\n\n### Resources Used\n1. https://www.nasa.gov/".into(),
    ]));

    let ctx = ExecCtx::builder("http://unused")
        .backend(mock.clone())
        .build()?;
    let agent = LlmAgent::new(Arc::new(ctx));

    let theme = Theme::new("Space Exploration")?;
    let count = TopicRange::CLI.sample()?;
    println!("Theme: {}\nNumber of topics: {}\n", theme, count);

    let observer = FnObserver(|p: &PipelineProgress| {
        println!("✅ {} completed!", p.label);
    });
    let result = pipeline::run_article(&agent, RunInput::new(theme, count), &observer).await?;

    println!("\n{}", packager::package(&result.theme, &result.content));
    println!("\nBackend calls: {}", mock.calls());
    Ok(())
}
