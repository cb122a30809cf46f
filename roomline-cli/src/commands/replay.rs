//! Replays a scripted diff session through a timeline provider.
//!
//! A script seeds the timeline and then lists steps that are fed in order:
//!
//! ```yaml
//! initial:
//!   - { id: "$1", type: event, sender: "@bob:example.org", content: { kind: text, body: hi } }
//! steps:
//!   - diff: { op: push_back, item: { id: "$2", type: event, sender: "@bob:example.org", content: { kind: text, body: again } } }
//!   - wait_ms: 250
//!   - state: fully_loaded
//! ```

use std::{fs, io::Write, path::Path, time::Duration};

use anyhow::{Context, bail};
use futures_util::StreamExt;
use serde::Deserialize;
use timeline::{
    DiffOperation, ProviderState, RawItem, SubscriptionFeed, TimelineItem, TimelineProvider,
    TimelineSnapshot, TimelineSubscription,
    config::{ConfigFormat, TimelineConfig},
};
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayScript {
    pub initial: Vec<RawItem>,
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Diff(DiffOperation),
    WaitMs(u64),
    State(ProviderState),
}

impl ReplayScript {
    /// Reads a YAML or JSON script, choosing the parser by file extension.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, has another extension,
    /// or does not parse.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script {}", path.display()))?;

        match ConfigFormat::from_path(path) {
            Ok(ConfigFormat::Yaml) => Self::from_yaml(&content),
            Ok(ConfigFormat::Json) => serde_json::from_str(&content)
                .with_context(|| format!("invalid replay script {}", path.display())),
            _ => bail!(
                "unsupported replay script '{}': expected a .yaml, .yml or .json file",
                path.display()
            ),
        }
    }

    fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yml::from_str(content).context("invalid replay script")
    }

    fn diff_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, ReplayStep::Diff(_)))
            .count()
    }
}

/// Runs `script_path` through a fresh timeline and writes every published
/// snapshot to `out`, starting with the seeded one.
///
/// # Errors
/// Returns an error if the script cannot be loaded or output cannot be written.
pub async fn run_replay<W: Write>(
    script_path: &Path,
    config: &TimelineConfig,
    json: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let script = ReplayScript::load(script_path)?;
    let label = script_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("replay")
        .to_string();
    info!(
        script = %script_path.display(),
        initial = script.initial.len(),
        diffs = script.diff_count(),
        window_ms = config.debounce_window_ms,
        "Starting replay"
    );

    let ReplayScript { initial, steps } = script;
    let (subscription, feed) = TimelineSubscription::channel(initial);
    let mut provider = TimelineProvider::spawn_labeled(label, subscription, config);
    let mut updates = provider.subscribe();

    write_snapshot(out, &provider.snapshot(), provider.provider_state(), json)?;
    let feeder = tokio::spawn(feed_steps(feed, steps));

    while let Some(snapshot) = updates.next().await {
        write_snapshot(out, &snapshot, provider.provider_state(), json)?;
    }

    feeder.await.context("replay feeder failed")?;
    provider.finished().await;

    if !json {
        writeln!(out, "final state: {}", provider.provider_state())?;
    }
    out.flush()?;
    Ok(())
}

async fn feed_steps(feed: SubscriptionFeed, steps: Vec<ReplayStep>) {
    for step in steps {
        let delivered = match step {
            ReplayStep::Diff(op) => feed.push(op),
            ReplayStep::State(state) => feed.set_state(state),
            ReplayStep::WaitMs(ms) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                true
            }
        };
        if !delivered {
            warn!("Timeline stopped before the replay script finished");
            return;
        }
    }
}

fn write_snapshot<W: Write>(
    out: &mut W,
    snapshot: &TimelineSnapshot,
    state: ProviderState,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, snapshot)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "flush {} ({} items, {})",
        snapshot.flush(),
        snapshot.len(),
        state
    )?;
    for (index, item) in snapshot.iter().enumerate() {
        writeln!(out, "{}", render_row(index, item))?;
    }
    Ok(())
}

fn render_row(index: usize, item: &TimelineItem) -> String {
    let style = item.group_style().map_or("-", |style| style.as_str());
    match item {
        TimelineItem::Event(event) => {
            let mut flags = Vec::new();
            if event.properties.is_edited {
                flags.push("edited".to_string());
            }
            for reaction in &event.properties.reactions {
                flags.push(format!("{} x{}", reaction.key, reaction.count));
            }
            if let Some(status) = event.properties.delivery_status {
                flags.push(status.as_str().to_string());
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            };
            format!(
                "{index:>4}  {style:<6}  {:<20}  {:<16}  {}{flags}",
                event.sender,
                event.id,
                event.content.summary()
            )
        }
        TimelineItem::Virtual(_) => format!(
            "{index:>4}  {style:<6}  {:<20}  {:<16}  {}",
            "",
            item.id(),
            item.debug_identifier()
        ),
    }
}
