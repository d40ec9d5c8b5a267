use article_topics::archive::{self, default_purge_pattern};
use article_topics::{
    packager, pipeline, FnAgent, NoopObserver, RunContext, RunInput, Stage, Theme, TopicRange,
};
use chrono::Local;
use std::fs;
use tempfile::TempDir;

/// Generate, save, zip, extract, then purge the archive.
#[tokio::test]
async fn generated_document_survives_archive_cycle() {
    let work = TempDir::new().unwrap();
    let agent = FnAgent(|stage: &Stage, ctx: &RunContext| {
        Ok(format!("## {} on {}\n", stage.label, ctx.theme))
    });
    let input = RunInput::new(
        Theme::new("Coral Reefs").unwrap(),
        TopicRange::CLI.sample().unwrap(),
    );
    let result = pipeline::run_article(&agent, input, &NoopObserver)
        .await
        .unwrap();

    let now = Local::now();
    let doc = packager::save_run(&result, work.path(), &now).unwrap();
    let expected = "# Theme: Coral Reefs\n\n---\n\n## Joining, Formatting, and Writing on Coral Reefs";
    assert_eq!(fs::read_to_string(&doc).unwrap(), expected);

    let zip_dir = work.path().join("zips");
    let zip_path = archive::archive(&doc, &zip_dir, &now).unwrap();
    let extracted = archive::extract(&zip_path, &work.path().join("unzipped")).unwrap();
    assert_eq!(extracted.len(), 1);
    assert_eq!(fs::read_to_string(&extracted[0]).unwrap(), expected);

    assert_eq!(archive::purge(&zip_dir, &default_purge_pattern(), false).unwrap(), 0);
    assert!(zip_path.exists());
    assert_eq!(archive::purge(&zip_dir, &default_purge_pattern(), true).unwrap(), 1);
    assert!(!zip_path.exists());
    assert!(doc.exists());
}
