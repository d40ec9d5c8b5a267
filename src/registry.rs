//! The five article-topic stages.
//!
//! Each stage pairs an agent persona with a task. Templates reference two
//! parameters, `{theme}` and `{topic_count}`, and are rendered when the
//! stages are built.

use crate::{
    error::Result,
    stage::{Stage, StageBuilder},
    types::{PipelineContext, Theme, TopicCount},
};

pub const PLAN: &str = "plan";
pub const RESEARCH: &str = "research";
pub const CONDENSE: &str = "condense";
pub const COLLECT_LINKS: &str = "collect-links";
pub const WRITE: &str = "write";

/// Stage names in execution order.
pub const STAGE_NAMES: [&str; 5] = [PLAN, RESEARCH, CONDENSE, COLLECT_LINKS, WRITE];

fn planner() -> StageBuilder {
    StageBuilder::new(PLAN)
        .label("Planning")
        .role("Topic Planner")
        .goal(
            "To collect {topic_count} engaging topics related to the theme: {theme}, \
             addressed to an academic audience",
        )
        .backstory(
            "You have been given a theme - {theme} - and you must collect {topic_count} topics \
             related to the theme, for people to write articles about. It can be in-depth core \
             topics related to the theme, or informatory topics as well. Your work is the basis \
             for the user to write an article (college graduate level) on these topics.",
        )
        .description(
            "1. Identify the latest trends related to {theme}, along with key players and noteworthy news
2. Identify the target audience based on {theme} and collect relevant headlines/topics
3. Develop a {theme}-related title list of {topic_count} items
4. Format the output as a numbered list with no additional commentary
5. Example:
    1. Topic One
    2. Topic Two
    3. Topic Three",
        )
        .expected_output("A {topic_count}-item numbered list of {theme}-related topics with no extra text")
}

fn researcher() -> StageBuilder {
    StageBuilder::new(RESEARCH)
        .label("Researching")
        .role("Topic Researcher")
        .goal(
            "To collect in-depth information (and their sources) on the {topic_count} \
             {theme}-related topics provided by the Topic Planner",
        )
        .backstory(
            "For each topic given by the Topic Planner, you do in-depth research, collect \
             information and the links of its sources. The Summary Generator and the Link \
             Collector work from your findings.",
        )
        .description(
            "For each topic received from the Topic Planner:
1. Conduct in-depth research on the topic
2. Use at least 5-6 sources
3. Collect information and source links
4. Format research content as:
    - Heading: \"### Research Findings\"
    - Bullet points with bolded subheadings
5. Format source links as:
    - Heading: \"### Source Links\"
    - Numbered list of exact URLs
6. Example:
    ### Research Findings
    - **Key Discovery:** Explanation of discovery
    - **Important Fact:** Detailed fact

    ### Source Links
    1. <exact link here>
    2. <exact link here>",
        )
        .expected_output("Structured research findings with exact source links for all topics")
        .depends_on(PLAN)
}

fn condenser() -> StageBuilder {
    StageBuilder::new(CONDENSE)
        .label("Condensing")
        .role("Summary Generator")
        .goal("To condense paragraphs of information into a title-one liner duo")
        .backstory(
            "You take the information from the Topic Researcher and split it into small chunks. \
             Each chunk becomes one titled bullet point. The user will elaborate on each point \
             as they see fit.",
        )
        .description(
            "1. Receive research content from Topic Researcher
2. For each logical chunk:
    a. Create a bolded heading (1-3 words)
    b. Add colon followed by 1-sentence summary
3. Output as:
    - Heading: \"### Condensed Information Points\"
    - Bullet points with headings
4. Do not add commentary
5. Example:
    ### Condensed Information Points
    - **Brain-Computer Interface:** Direct pathway between brain and external devices
    - **Neural Signals:** BCIs interpret signals to control computers",
        )
        .expected_output("Markdown section with bolded headings and colon-separated summaries")
        .depends_on(RESEARCH)
}

fn link_collector() -> StageBuilder {
    StageBuilder::new(COLLECT_LINKS)
        .label("Link Collecting")
        .role("Link Collector")
        .goal("To collect all the links of the material that were used as sources by the Topic Researcher")
        .backstory(
            "You take all the links from the researcher and list them under the title \
             'Resources Used'.",
        )
        .description(
            "1. Collect all source links from Topic Researcher
2. Format as:
    - Heading: \"### Resources Used\"
    - Numbered list of exact URLs
3. Preserve original link formatting
4. Do not modify or shorten URLs
5. Example:
    ### Resources Used
    1. https://www.nature.com/articles/bci-technology
    2. https://ieeexplore.ieee.org/document/123456",
        )
        .expected_output("Numbered list of exact source URLs under heading")
        .depends_on(RESEARCH)
}

fn writer() -> StageBuilder {
    StageBuilder::new(WRITE)
        .label("Joining, Formatting, and Writing")
        .role("Article Prompt Writer")
        .goal(
            "To take each of the {topic_count} topics the Topic Planner has generated, give the \
             condensed points the Summary Generator produced for it, then the links the Link \
             Collector collected for it, and repeat for the rest of the topics",
        )
        .backstory(
            "The Topic Planner sent {topic_count} topics to the Topic Researcher, who passed the \
             information to the Summary Generator and the links to the Link Collector. All of \
             their chunks reach you, and you order them and show them to the user.",
        )
        .description(
            "For each of the {topic_count} topics:
1. Start with an H2 heading for the topic
2. Include condensed points from Summary Generator
3. Include resource links from Link Collector
4. Maintain exact formatting:
    ## Topic <Number>: <Topic Title>

    ### Condensed Information Points
    - **heading:** summary

    ### Resources Used
    1. <exact link here>
5. Do not add commentary or summaries",
        )
        .expected_output("Structured output with headings, bullet points, and exact links for all topics")
        .depends_on(PLAN)
        .depends_on(CONDENSE)
        .depends_on(COLLECT_LINKS)
}

/// Build the five stages for `theme` and `count`, in execution order.
///
/// Ordinals are assigned when the stages are added to a
/// [`Pipeline`](crate::pipeline::Pipeline).
pub fn article_stages(theme: &Theme, count: TopicCount) -> Result<Vec<Stage>> {
    let context = PipelineContext::for_run(theme, count);
    [planner(), researcher(), condenser(), link_collector(), writer()]
        .into_iter()
        .map(|builder| builder.build(&context))
        .collect()
}
