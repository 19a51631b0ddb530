//! Screen layout for each phase of a run.
//!
//! Lays out the title, status, dial frame, readouts, history chart and key
//! hints for the current [`RunState`]. The dial itself comes from the gauge
//! rasterizer as plain text and is only colored here.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::time::Duration;

use crate::gauge::{GaugeFrame, SpeedTier, DUAL_SPLIT};
use crate::orchestrator::{ErrorInfo, RunState, TestPhase};

const TITLE: &str = "fastdial ─ Internet Speed Test";

/// Narrower terminals get the compact layout.
const MINIMAL_MODE_THRESHOLD: u16 = 60;

pub fn is_minimal_mode(width: u16) -> bool {
    width < MINIMAL_MODE_THRESHOLD
}

/// Color of a speed tier.
pub fn tier_color(tier: SpeedTier) -> Color {
    match tier {
        SpeedTier::Slow => Color::Cyan,
        SpeedTier::Moderate => Color::Green,
        SpeedTier::Fast => Color::Yellow,
        SpeedTier::Peak => Color::Red,
    }
}

/// Get color for speed value based on its tier.
pub fn speed_color(speed_mbps: f64) -> Color {
    tier_color(SpeedTier::of(speed_mbps))
}

pub fn format_speed(speed_mbps: f64) -> String {
    format!("{:.1} Mbps", speed_mbps)
}

pub fn format_latency(latency_ms: f64) -> String {
    format!("{:.1} ms", latency_ms)
}

pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Status line for each phase.
pub fn status_text(phase: TestPhase) -> &'static str {
    match phase {
        TestPhase::Init => "Initializing speed test...",
        TestPhase::Ping => "Testing connection to server...",
        TestPhase::Downloading => "Testing download speed...",
        TestPhase::Uploading => "Testing upload speed...",
        TestPhase::Complete => "Speed test complete!",
        TestPhase::Error => "Error occurred:",
    }
}

/// Server line, worded after how far the run got.
pub fn server_text(state: &RunState) -> String {
    let label = if state.server_label.is_empty() {
        "locating..."
    } else {
        state.server_label.as_str()
    };

    match state.phase {
        TestPhase::Init | TestPhase::Ping | TestPhase::Error => {
            format!("Server: {}", label)
        }
        TestPhase::Downloading | TestPhase::Uploading => {
            format!("Connected to: {}", label)
        }
        TestPhase::Complete => format!("Tested via: {}", label),
    }
}

/// The dial for the current phase.
pub fn gauge_for(state: &RunState) -> GaugeFrame {
    let displayed = state.displayed_value();

    match state.phase {
        TestPhase::Init | TestPhase::Ping => GaugeFrame::single(0.0),
        TestPhase::Downloading => GaugeFrame::dual(displayed, 0.0),
        TestPhase::Uploading => GaugeFrame::dual(state.download_speed, displayed),
        TestPhase::Complete => {
            GaugeFrame::dual(state.download_speed, state.upload_speed)
        }
        TestPhase::Error => {
            GaugeFrame::dual(state.download_speed, state.upload_speed)
        }
    }
}

/// Draw `state`, picking the compact layout on narrow terminals.
pub fn render_frame(frame: &mut Frame, state: &RunState) {
    if is_minimal_mode(frame.area().width) {
        render_minimal_frame(frame, state);
    } else {
        render_normal_frame(frame, state);
    }
}

fn render_normal_frame(frame: &mut Frame, state: &RunState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title
            Constraint::Length(2), // Status and server
            Constraint::Min(8),    // Dial, readouts, chart
            Constraint::Length(2), // Key hints
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_status(frame, chunks[1], state);
    render_body(frame, chunks[2], state);
    render_key_hints(frame, chunks[3], state);
}

/// Text-only layout without the dial.
pub fn render_minimal_frame(frame: &mut Frame, state: &RunState) {
    let mut lines = vec![
        Line::from(Span::styled(
            status_text(state.phase),
            phase_style(state.phase),
        )),
        Line::from(Span::styled(
            server_text(state),
            Style::default().fg(Color::Cyan),
        )),
    ];

    if let Some(ref error) = state.last_error {
        lines.push(Line::from(Span::styled(
            error.message.clone(),
            Style::default().fg(Color::Red),
        )));
    } else {
        let (download, upload) = current_speeds(state);
        lines.push(speed_line("Down", download));
        lines.push(speed_line("Up", upload));
        if state.ping > 0.0 {
            lines.push(Line::from(format!("Ping: {}", format_latency(state.ping))));
        }
    }

    lines.push(Line::from(Span::styled(
        key_hint(state.phase),
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), frame.area());
}

fn render_title(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(TITLE).style(
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    );
    frame.render_widget(paragraph, inner);
}

fn render_status(frame: &mut Frame, area: Rect, state: &RunState) {
    let mut status = vec![Span::styled(
        status_text(state.phase),
        phase_style(state.phase),
    )];
    if let Some(ref error) = state.last_error {
        status.push(Span::raw(" "));
        status.push(Span::styled(
            error.message.clone(),
            Style::default().fg(Color::Red),
        ));
    }

    let lines = vec![
        Line::from(status),
        Line::from(Span::styled(
            server_text(state),
            Style::default().fg(Color::Cyan),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_body(frame: &mut Frame, area: Rect, state: &RunState) {
    let mut lines = dial_lines(&gauge_for(state));
    lines.push(Line::default());
    lines.extend(readout_lines(state));

    if let Some(ref error) = state.last_error {
        lines.push(Line::default());
        lines.extend(error_lines(error));
    }

    if state.phase == TestPhase::Downloading && !state.history.is_empty() {
        let chart = state.history.chart_rows();
        if !chart.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Download history",
                Style::default().fg(Color::DarkGray),
            )));
            lines.extend(chart.into_iter().map(|row| {
                Line::from(Span::styled(row, Style::default().fg(Color::Cyan)))
            }));
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_key_hints(frame: &mut Frame, area: Rect, state: &RunState) {
    let paragraph = Paragraph::new(key_hint(state.phase))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Color the dial rows by the tier of the value each half shows.
pub fn dial_lines(gauge: &GaugeFrame) -> Vec<Line<'static>> {
    let colors: Vec<Color> =
        gauge.readouts.iter().map(|r| tier_color(r.tier)).collect();

    let mut lines: Vec<Line> = gauge
        .rows
        .iter()
        .map(|row| match colors.as_slice() {
            [left, right] => {
                let split: String = row.chars().take(DUAL_SPLIT).collect();
                let rest: String = row.chars().skip(DUAL_SPLIT).collect();
                Line::from(vec![
                    Span::styled(split, Style::default().fg(*left)),
                    Span::styled(rest, Style::default().fg(*right)),
                ])
            }
            [single] => {
                Line::from(Span::styled(row.clone(), Style::default().fg(*single)))
            }
            _ => Line::from(row.clone()),
        })
        .collect();

    lines.push(Line::from(Span::styled(
        gauge.scale,
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        gauge.unit,
        Style::default().fg(Color::DarkGray),
    )));

    let mut readouts = Vec::new();
    for (i, readout) in gauge.readouts.iter().enumerate() {
        if i > 0 {
            readouts.push(Span::raw("    "));
        }
        readouts.push(Span::styled(
            readout.to_string(),
            Style::default()
                .fg(tier_color(readout.tier))
                .add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::from(readouts));

    lines
}

fn readout_lines(state: &RunState) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    if state.ping > 0.0 {
        lines.push(Line::from(vec![
            Span::styled("Ping: ", label),
            Span::raw(format_latency(state.ping)),
        ]));
    }

    let (download, upload) = current_speeds(state);
    if let Some(speed) = download {
        lines.push(Line::from(vec![
            Span::styled("Download: ", label),
            Span::styled(format_speed(speed), Style::default().fg(speed_color(speed))),
        ]));
    }
    if let Some(speed) = upload {
        lines.push(Line::from(vec![
            Span::styled("Upload: ", label),
            Span::styled(format_speed(speed), Style::default().fg(speed_color(speed))),
        ]));
    }

    if let Some(duration) = state.duration {
        lines.push(Line::from(vec![
            Span::styled("Test duration: ", label),
            Span::raw(format_duration(duration)),
        ]));
    }

    lines
}

/// Download and upload figures worth showing in the current phase.
fn current_speeds(state: &RunState) -> (Option<f64>, Option<f64>) {
    match state.phase {
        TestPhase::Init | TestPhase::Ping => (None, None),
        TestPhase::Downloading => (Some(state.displayed_value()), None),
        TestPhase::Uploading => {
            (Some(state.download_speed), Some(state.displayed_value()))
        }
        TestPhase::Complete | TestPhase::Error => {
            (Some(state.download_speed), Some(state.upload_speed))
        }
    }
}

fn speed_line(label: &str, speed: Option<f64>) -> Line<'static> {
    match speed {
        Some(speed) => Line::from(Span::styled(
            format!("{}: {}", label, format_speed(speed)),
            Style::default().fg(speed_color(speed)),
        )),
        None => Line::from(format!("{}: --", label)),
    }
}

fn error_lines(error: &ErrorInfo) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!("Error: {}", error.message),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))];

    if let Some(ref suggestion) = error.suggestion {
        lines.push(Line::from(Span::styled(
            suggestion.clone(),
            Style::default().fg(Color::Yellow),
        )));
    }

    lines
}

fn key_hint(phase: TestPhase) -> &'static str {
    match phase {
        TestPhase::Complete => "Press 'r' to run again, 'q' to quit",
        TestPhase::Error => "Press 'r' to try again, 'q' to quit",
        _ => "Press 'q' to quit",
    }
}

fn phase_style(phase: TestPhase) -> Style {
    let color = match phase {
        TestPhase::Complete => Color::Green,
        TestPhase::Error => Color::Red,
        _ => Color::Yellow,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{AppEvent, Completion, Orchestrator, StageEvent};
    use crate::signal::FixedSeed;
    use proptest::prelude::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Instant;

    fn run_to(phase: TestPhase) -> RunState {
        let start = Instant::now();
        let mut orchestrator = Orchestrator::new(Box::new(FixedSeed(123)), start);
        orchestrator.start(start);
        let run = orchestrator.run();
        let at = |secs: f64| start + Duration::from_secs_f64(secs);

        let mut events = vec![
            (StageEvent::ServerLocated("Mumbai, MH".into()), 0.0),
            (StageEvent::PingMeasured(18.0), 1.0),
            (StageEvent::DownloadSettled(42.0), 6.0),
            (StageEvent::UploadSampled(12.0), 10.0),
            (
                StageEvent::Completed(Completion {
                    download: 73.0,
                    upload: 48.0,
                    ping: 28.0,
                    server: "Pune, MH".into(),
                }),
                10.5,
            ),
        ];
        let steps = match phase {
            TestPhase::Init => 0,
            TestPhase::Ping => 1,
            TestPhase::Downloading => 3,
            TestPhase::Uploading => 4,
            TestPhase::Complete => 5,
            TestPhase::Error => {
                events[1] = (StageEvent::Fault("background test lost".into()), 1.0);
                2
            }
        };

        for (event, secs) in events.into_iter().take(steps) {
            orchestrator.handle(AppEvent::Stage { run, event }, at(secs));
            if phase == TestPhase::Downloading && secs == 1.0 {
                for tick in 0..20 {
                    orchestrator.handle(AppEvent::Tick, at(3.0 + tick as f64 * 0.1));
                }
            }
        }

        assert_eq!(orchestrator.state().phase, phase);
        orchestrator.state().clone()
    }

    fn render_to_string(state: &RunState, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|frame| render_frame(frame, state)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                let cell = buffer.cell((x, y)).unwrap();
                text.push_str(cell.symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_init_screen() {
        let rendered = render_to_string(&run_to(TestPhase::Init), 100, 60);
        assert!(rendered.contains(TITLE));
        assert!(rendered.contains("Initializing speed test..."));
        assert!(rendered.contains("Server: locating..."));
        assert!(rendered.contains("Speed: 0.0 Mbps"));
        assert!(rendered.contains('●'));
        assert!(rendered.contains("Press 'q' to quit"));
    }

    #[test]
    fn test_ping_screen() {
        let rendered = render_to_string(&run_to(TestPhase::Ping), 100, 60);
        assert!(rendered.contains("Testing connection to server..."));
        assert!(rendered.contains("Server: Mumbai, MH"));
    }

    #[test]
    fn test_download_screen_shows_history() {
        let state = run_to(TestPhase::Downloading);
        let rendered = render_to_string(&state, 100, 70);

        assert!(rendered.contains("Testing download speed..."));
        assert!(rendered.contains("Connected to: Mumbai, MH"));
        assert!(rendered.contains("Ping: 18.0 ms"));
        assert!(rendered.contains("Download history"));
        assert!(rendered.contains("Upload: 0.0 Mbps"));
    }

    #[test]
    fn test_upload_screen() {
        let rendered = render_to_string(&run_to(TestPhase::Uploading), 100, 60);
        assert!(rendered.contains("Testing upload speed..."));
        assert!(rendered.contains("Download: 42.0 Mbps"));
        assert!(!rendered.contains("Download history"));
    }

    #[test]
    fn test_complete_screen() {
        let rendered = render_to_string(&run_to(TestPhase::Complete), 100, 60);
        assert!(rendered.contains("Speed test complete!"));
        assert!(rendered.contains("Tested via: Pune, MH"));
        assert!(rendered.contains("Download: 73.0 Mbps"));
        assert!(rendered.contains("Upload: 48.0 Mbps"));
        assert!(rendered.contains("Ping: 28.0 ms"));
        assert!(rendered.contains("Test duration: 10.5s"));
        assert!(rendered.contains("Press 'r' to run again"));
    }

    #[test]
    fn test_error_screen() {
        let rendered = render_to_string(&run_to(TestPhase::Error), 100, 60);
        assert!(rendered.contains("Error occurred:"));
        assert!(rendered.contains("background test lost"));
        assert!(rendered.contains("Press 'r' to try again"));
    }

    #[test]
    fn test_minimal_layout() {
        let rendered = render_to_string(&run_to(TestPhase::Complete), 50, 10);
        assert!(rendered.contains("Speed test complete!"));
        assert!(rendered.contains("Down: 73.0 Mbps"));
        assert!(rendered.contains("Up: 48.0 Mbps"));
        assert!(!rendered.contains('●'));
    }

    #[test]
    fn test_dial_lines_split_colors() {
        let lines = dial_lines(&GaugeFrame::dual(90.0, 10.0));
        let row = &lines[10];
        assert_eq!(row.spans.len(), 2);
        assert_eq!(row.spans[0].style.fg, Some(Color::Red));
        assert_eq!(row.spans[1].style.fg, Some(Color::Cyan));
        assert_eq!(row.spans[0].content.chars().count(), DUAL_SPLIT);
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(speed_color(10.0), Color::Cyan);
        assert_eq!(speed_color(45.0), Color::Green);
        assert_eq!(speed_color(70.0), Color::Yellow);
        assert_eq!(speed_color(95.0), Color::Red);
    }

    #[test]
    fn test_minimal_mode_boundary() {
        assert!(!is_minimal_mode(60));
        assert!(is_minimal_mode(59));
        assert!(is_minimal_mode(40));
        assert!(!is_minimal_mode(80));
    }

    proptest! {
        #[test]
        fn prop_speed_formatting_precision(speed in 0.0f64..10_000.0) {
            let formatted = format_speed(speed);
            prop_assert!(formatted.ends_with(" Mbps"));

            let numeric_part = formatted.trim_end_matches(" Mbps");
            let dot_pos = numeric_part.find('.');
            prop_assert!(dot_pos.is_some());
            prop_assert_eq!(numeric_part.len() - dot_pos.unwrap_or(0) - 1, 1);
        }

        #[test]
        fn prop_minimal_mode_below_threshold(width in 0u16..60) {
            prop_assert!(is_minimal_mode(width));
        }

        /// Identical states always render identical screens.
        #[test]
        fn prop_rendering_is_deterministic(width in 20u16..120, height in 5u16..60) {
            let state = run_to(TestPhase::Complete);
            prop_assert_eq!(
                render_to_string(&state, width, height),
                render_to_string(&state, width, height)
            );
        }
    }
}
