//! Recyclist simulator - Entry Point
//!
//! Drives a list through a scripted scroll against a recording host and
//! prints one JSON line per frame.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use recyclist::config::ListConfig;
use recyclist::layout::RenderedLayout;
use recyclist::model::{AppError, DataProvider, Dimension, LayoutProvider, Orientation, VecDataProvider};
use recyclist::orchestrator::{HostCall, ListPhase, RecordingHost, RecyclerListView, RecyclerListViewBuilder, ScrollSample};
use recyclist::schedule::Millis;

/// Simulated frame duration.
const FRAME_MS: Millis = 16;

type SimulatedList = RecyclerListView<VecDataProvider<usize>, RecordingHost>;

/// Recyclist simulator - scroll a virtualized list and report its windows
#[derive(Parser, Debug)]
#[command(name = "recyclist")]
#[command(version)]
#[command(about = "Simulate a virtualized list scrolling against a headless host")]
pub struct Args {
    /// Number of items
    #[arg(short = 'n', long, default_value = "1000")]
    pub items: usize,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "400x800", value_parser = parse_viewport)]
    pub viewport: Dimension,

    /// Estimated main-axis size of every item
    #[arg(long, default_value = "100")]
    pub estimate: f64,

    /// Maximum deviation of measured sizes from the estimate (non deterministic rendering)
    #[arg(long, default_value = "0")]
    pub jitter: f64,

    /// Scroll distance per frame
    #[arg(long, default_value = "250")]
    pub step: f64,

    /// Number of scroll frames
    #[arg(long, default_value = "10")]
    pub frames: u32,

    /// Jump to this index after the scripted frames
    #[arg(long)]
    pub scroll_to: Option<usize>,

    /// Render-ahead distance in pixels
    #[arg(long)]
    pub render_ahead: Option<f64>,

    /// Scroll horizontally
    #[arg(long)]
    pub horizontal: bool,

    /// Measure items after mounting instead of trusting estimates
    #[arg(long)]
    pub non_deterministic: bool,

    /// Keep visible items in place while sizes above them change
    #[arg(long)]
    pub preserve_position: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_viewport(raw: &str) -> Result<Dimension, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let parse = |side: &str| {
        side.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or_else(|| format!("invalid viewport side {side:?}"))
    };
    Ok(Dimension::new(parse(width)?, parse(height)?))
}

/// One line of simulator output.
#[derive(Debug, Serialize)]
struct FrameReport {
    frame: u32,
    now: Millis,
    offset: f64,
    phase: ListPhase,
    first_visible: Option<usize>,
    last_visible: Option<usize>,
    engaged: usize,
    slots: usize,
    content_extent: f64,
    preserved_index: Option<usize>,
}

/// Sizes a simulated renderer would measure.
#[derive(Debug, Clone, Copy)]
struct Measurer {
    orientation: Orientation,
    estimate: f64,
    jitter: f64,
    cross: f64,
}

impl Measurer {
    /// Deterministic per-index deviation in `[-jitter, jitter]`.
    fn main_size(&self, index: usize) -> f64 {
        let phase = (index.wrapping_mul(7919) % 13) as f64 / 12.0;
        (self.estimate + self.jitter * (2.0 * phase - 1.0)).max(1.0)
    }

    fn size(&self, index: usize) -> Dimension {
        self.orientation.dimension(self.main_size(index), self.cross)
    }
}

struct Simulation {
    list: SimulatedList,
    measurer: Measurer,
    measured: HashSet<usize>,
    viewport: Dimension,
    offset: f64,
    now: Millis,
}

impl Simulation {
    fn new(args: &Args, config: ListConfig) -> Result<Self, AppError> {
        let orientation = config.orientation;
        let cross = orientation.cross(args.viewport);
        let estimate = orientation.dimension(args.estimate, cross);
        let data = VecDataProvider::new(|a: &usize, b: &usize| a != b).clone_with_rows((0..args.items).collect());

        let mut list = RecyclerListViewBuilder::new()
            .data_provider(data)
            .layout_provider(LayoutProvider::uniform(estimate))
            .config(config)
            .build(RecordingHost::new(), 0)?;
        list.on_size_changed(args.viewport, 0)?;

        Ok(Self {
            list,
            measurer: Measurer {
                orientation,
                estimate: args.estimate,
                jitter: args.jitter,
                cross,
            },
            measured: HashSet::new(),
            viewport: args.viewport,
            offset: 0.0,
            now: 0,
        })
    }

    fn orientation(&self) -> Orientation {
        self.list.config().orientation
    }

    fn scroll_by(&mut self, delta: f64) -> Result<(), AppError> {
        let o = self.orientation();
        let max = (o.main(self.list.content_extent()) - o.main(self.viewport)).max(0.0);
        self.offset = (self.offset + delta).clamp(0.0, max);
        self.emit_scroll()
    }

    fn emit_scroll(&mut self) -> Result<(), AppError> {
        let sample = ScrollSample::at(self.orientation().point_at(self.offset))
            .with_sizes(self.list.content_extent(), self.viewport);
        self.list.on_scroll(sample, self.now)?;
        Ok(())
    }

    /// Report sizes of newly engaged items, the way a renderer would after mounting them.
    fn measure(&mut self) {
        let config = self.list.config();
        if !config.force_non_deterministic_rendering {
            return;
        }
        let engaged = self.list.engaged_indexes().to_vec();
        if config.is_auto_layout() {
            let o = self.orientation();
            let Some(mut cursor) = engaged
                .first()
                .and_then(|&index| self.list.get_layout(index))
                .map(|layout| o.main_pos(layout))
            else {
                return;
            };
            let rendered: Vec<RenderedLayout> = engaged
                .iter()
                .map(|&index| {
                    let size = self.measurer.main_size(index);
                    let item = RenderedLayout {
                        index,
                        offset: cursor,
                        size,
                    };
                    cursor += size;
                    item
                })
                .collect();
            let id = self.list.auto_layout_id();
            self.list.on_auto_layout(id, &rendered, self.now);
            return;
        }
        for index in engaged {
            if self.measured.insert(index) {
                self.list.on_item_size_changed(index, self.measurer.size(index), self.now);
            }
        }
    }

    /// Apply host commands that feed back into the list: programmatic scrolls
    /// move the container, and growth requests are measured at once.
    fn follow_host(&mut self) -> Result<(), AppError> {
        let o = self.orientation();
        let mut scrolled = false;
        for call in self.list.host_mut().take_calls() {
            match call {
                HostCall::ScrollTo { offset, .. } => {
                    self.offset = o.main_of_point(offset);
                    scrolled = true;
                }
                HostCall::RequestContentMeasure { extent } => {
                    debug!(extent, "container grown");
                    self.list.on_content_measured(extent, self.now);
                }
                _ => {}
            }
        }
        if scrolled {
            self.emit_scroll()?;
        }
        Ok(())
    }

    fn settle(&mut self) -> Result<(), AppError> {
        self.measure();
        self.list.advance_until_idle(self.now)?;
        self.follow_host()?;
        self.list.advance_until_idle(self.now)?;
        Ok(())
    }

    fn report(&self, frame: u32) -> FrameReport {
        let visible = self.list.visible_indexes();
        FrameReport {
            frame,
            now: self.now,
            offset: self.offset,
            phase: self.list.phase(),
            first_visible: visible.first().copied(),
            last_visible: visible.last().copied(),
            engaged: self.list.engaged_indexes().len(),
            slots: self.list.render_stack().len(),
            content_extent: self.orientation().main(self.list.content_extent()),
            preserved_index: self.list.preserved_index(),
        }
    }
}

fn write_report(out: &mut impl Write, report: &FrameReport) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, report).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Run the scripted scroll and write one report per frame to `out`.
fn simulate(args: &Args, config: ListConfig, out: &mut impl Write) -> Result<(), AppError> {
    let mut sim = Simulation::new(args, config)?;
    sim.settle()?;
    write_report(out, &sim.report(0))?;

    for frame in 1..=args.frames {
        sim.now += FRAME_MS;
        sim.scroll_by(args.step)?;
        sim.settle()?;
        write_report(out, &sim.report(frame))?;
    }

    if let Some(index) = args.scroll_to {
        sim.now += FRAME_MS;
        sim.list.scroll_to_index(index, false, sim.now)?;
        sim.settle()?;
    }

    // Give the refix its quiet period.
    sim.now += sim.list.config().timing.refix_debounce_ms + FRAME_MS;
    sim.settle()?;
    write_report(out, &sim.report(args.frames + 1))?;

    info!(
        items = sim.list.data().size(),
        frames = args.frames,
        offset = sim.offset,
        "simulation finished"
    );
    Ok(())
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = recyclist::config::loader::load_config_with_precedence(args.config.clone())?;
        let merged = recyclist::config::loader::merge_config(config_file);
        let with_env = recyclist::config::loader::apply_env_overrides(merged);

        // Flags only override when set.
        let orientation_override = args.horizontal.then_some(Orientation::Horizontal);
        let non_deterministic_override = args.non_deterministic.then_some(true);
        let preserve_override = args.preserve_position.then_some(true);

        recyclist::config::loader::apply_cli_overrides(
            with_env,
            args.render_ahead,
            orientation_override,
            non_deterministic_override,
            preserve_override,
        )
    };

    recyclist::logging::init(&config.log_file_path, recyclist::logging::DEFAULT_FILTER)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    simulate(&args, config.list, &mut out)
}
