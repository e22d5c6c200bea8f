use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame,
};

use crate::{
    pipeline::PlotState,
    visibility::{Series, VisibilityFlags},
    window::SampleWindow,
};

/// Visible axis ranges. Survives ticks where nothing is visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: [0.0, 1.0],
            y: [0.0, 1.0],
        }
    }
}

impl Viewport {
    /// Fits x to the window's time span and y to the visible values plus `margin`.
    /// Returns `false` and leaves the view alone when there is nothing to fit.
    pub fn refresh(
        &mut self,
        window: &SampleWindow,
        flags: &VisibilityFlags,
        margin: f64,
    ) -> bool {
        let (Some((oldest, newest)), Some((lo, hi))) = (window.time_span(), window.bounds(flags))
        else {
            return false;
        };
        self.x = [oldest, newest];
        self.y = [lo - margin, hi + margin];
        true
    }
}

pub fn series_color(series: Series) -> Color {
    match series {
        Series::Raw => Color::Red,
        Series::Scaled => Color::Green,
        Series::Duty => Color::Blue,
    }
}

// A single-sample window has a zero-width x range, which the chart cannot scale.
fn axis_bounds([lo, hi]: [f64; 2]) -> [f64; 2] {
    if hi - lo > f64::EPSILON {
        [lo, hi]
    } else {
        [lo - 0.5, hi + 0.5]
    }
}

fn axis_labels([lo, hi]: [f64; 2], precision: usize) -> Vec<Span<'static>> {
    [lo, (lo + hi) / 2.0, hi]
        .into_iter()
        .map(|v| Span::raw(format!("{v:.precision$}")))
        .collect()
}

pub fn draw(frame: &mut Frame, state: &PlotState, source: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(frame.size());
    draw_chart(frame, chunks[0], state);
    draw_footer(frame, chunks[1], state, source);
}

fn draw_chart(frame: &mut Frame, area: Rect, state: &PlotState) {
    let contents = state.window.current_contents(&state.visibility);
    let points: Vec<Vec<(f64, f64)>> = Series::ALL
        .iter()
        .map(|series| contents.points(*series))
        .collect();
    let datasets: Vec<Dataset> = Series::ALL
        .iter()
        .zip(&points)
        .map(|(series, data)| {
            Dataset::default()
                .name(series.label())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(*series)))
                .data(data)
        })
        .collect();

    let x = axis_bounds(state.view.x);
    let y = axis_bounds(state.view.y);
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    " Photocell / LED PWM ",
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(Style::default().fg(Color::DarkGray))
                .bounds(x)
                .labels(axis_labels(x, 1)),
        )
        .y_axis(
            Axis::default()
                .title("Value")
                .style(Style::default().fg(Color::DarkGray))
                .bounds(y)
                .labels(axis_labels(y, 0)),
        )
        .legend_position(Some(LegendPosition::TopRight))
        .hidden_legend_constraints((Constraint::Percentage(50), Constraint::Percentage(50)));
    frame.render_widget(chart, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &PlotState, source: &str) {
    let toggles: Vec<Span> = Series::ALL
        .iter()
        .map(|series| {
            let on = state.visibility.is_visible(*series);
            let style = if on {
                Style::default().fg(series_color(*series))
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(
                format!(" {}:{} ", series.label(), if on { "ON" } else { "OFF" }),
                style,
            )
        })
        .collect();

    let latest = match state.window.latest() {
        Some(s) => format!("raw={} scaled={} pwm={}%", s.raw, s.scaled, s.duty_cycle_percent),
        None => "waiting for samples".to_string(),
    };
    let mut first = vec![Span::styled(
        format!("{source} "),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    first.extend(toggles);
    first.push(Span::raw(format!(
        " | {latest} | duty now {}% | {}",
        state.duty_cycle,
        state.metrics.snapshot()
    )));

    let mut second = vec![Span::styled(
        "r/s/p toggle raw/scaled/pwm  q quit",
        Style::default().fg(Color::DarkGray),
    )];
    let notices = [
        state
            .transport_error
            .as_ref()
            .map(|err| Span::styled(err.clone(), Style::default().fg(Color::Red))),
        state.idle_for.map(|idle| {
            Span::styled(
                format!("no samples for {:.0}s", idle.as_secs_f64()),
                Style::default().fg(Color::Yellow),
            )
        }),
        state.status.as_ref().map(|status| Span::raw(status.clone())),
    ];
    for notice in notices.into_iter().flatten() {
        second.push(Span::raw("  | "));
        second.push(notice);
    }

    let footer = Paragraph::new(vec![Line::from(first), Line::from(second)])
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}
