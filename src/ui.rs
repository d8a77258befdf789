//! UI rendering and layout utilities

use crate::constants::ui::{BAR_BORDER_WIDTH, OVERLAY_HEIGHT, OVERLAY_WIDTH};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// What the overlay should show this frame
#[derive(Clone, Debug, Default)]
pub struct OverlayView {
    pub visible: bool,
    pub text: String,
    /// Fill of the volume bar, `0.0..=1.0`
    pub ratio: Option<f64>,
}

/// Create a gradient bar showing the volume level
pub fn create_gradient_bar(width: usize, ratio: f64) -> Line<'static> {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let partial_fill = (ratio * width as f64) - filled as f64;
    let mut spans = Vec::with_capacity(width);

    for i in 0..width {
        let color = if i < width / 3 {
            Color::Green
        } else if i < 2 * width / 3 {
            Color::Yellow
        } else {
            Color::Red
        };

        let ch = if i < filled {
            '█'
        } else if i == filled && partial_fill > 0.0 {
            match (partial_fill * 8.0) as usize {
                0..=1 => '░',
                2..=3 => '▒',
                4..=5 => '▓',
                _ => '█',
            }
        } else {
            '░'
        };
        spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
    }

    Line::from(spans)
}

/// Rectangle of the given size centered in `area`, shrunk to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Render the overlay, or just the idle hint while it is hidden
pub fn render_overlay(f: &mut Frame, view: &OverlayView) {
    let size = f.size();

    if size.height > 0 {
        let hint = Paragraph::new("pinchvol: pinch to set volume, Esc to quit")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(hint, Rect::new(size.x, size.y + size.height - 1, size.width, 1));
    }

    if !view.visible {
        return;
    }

    let area = centered_rect(OVERLAY_WIDTH, OVERLAY_HEIGHT, size);
    let mut lines = vec![Line::from(Span::styled(
        view.text.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(ratio) = view.ratio {
        let bar_width = (area.width as usize).saturating_sub(BAR_BORDER_WIDTH);
        lines.push(Line::from(""));
        lines.push(create_gradient_bar(bar_width, ratio));
    }

    let overlay = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(Clear, area);
    f.render_widget(overlay, area);
}
