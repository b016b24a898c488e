use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::framebuffer::{Frame, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// The machine pushes a framebuffer snapshot here after every cycle that
/// drew or cleared. Implementations must treat the frame as read-only; it
/// is a copy and mutating it changes nothing in the machine.
pub trait FrameSink {
    fn refresh(&mut self, frame: &Frame) -> Result<(), io::Error>;
}

/// expand one bitplane of a frame into x, y float coords suitable for
/// rendering with TUI
fn plane_points(frame: &Frame, lit: bool) -> Vec<(f64, f64)> {
    frame
        .iter()
        .enumerate()
        .filter(|(_, &pixel)| (pixel != 0) == lit)
        .map(|(index, _)| {
            (
                (index % DISPLAY_WIDTH) as f64,
                -1.0 * (index / DISPLAY_WIDTH) as f64,
            )
        })
        .collect()
}

/// monochrome display in a terminal, rendered with TUI's crossterm backend
/// at a 1:1 pixel-to-cell scale
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TermDisplay {
    pub fn new() -> Result<TermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(TermDisplay { terminal })
    }
}

impl FrameSink for TermDisplay {
    fn refresh(&mut self, frame: &Frame) -> Result<(), io::Error> {
        self.terminal.draw(|f| {
            let size = Rect::new(
                0,
                0,
                2 + DISPLAY_WIDTH as u16,
                2 + DISPLAY_HEIGHT as u16,
            );

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("vip8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (DISPLAY_WIDTH - 1) as f64])
                .y_bounds([-1.0 * (DISPLAY_HEIGHT - 1) as f64, 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &plane_points(frame, false),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &plane_points(frame, true),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// discards every frame; useful for tests and headless runs
pub struct NullSink;

impl FrameSink for NullSink {
    fn refresh(&mut self, _frame: &Frame) -> Result<(), io::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::DISPLAY_SIZE;

    #[test]
    fn test_blank_frame_has_no_lit_points() {
        let frame = [0u8; DISPLAY_SIZE];
        assert!(plane_points(&frame, true).is_empty());
        assert_eq!(plane_points(&frame, false).len(), DISPLAY_SIZE);
    }

    #[test]
    fn test_point_coords_are_row_major() {
        let mut frame = [0u8; DISPLAY_SIZE];
        frame[DISPLAY_WIDTH + 2] = 0x01; // (2, 1)
        let lit = plane_points(&frame, true);
        assert_eq!(lit, vec![(2.0, -1.0)]);
    }

    #[test]
    fn test_null_sink_accepts_frames() {
        let mut sink = NullSink;
        assert!(sink.refresh(&[0u8; DISPLAY_SIZE]).is_ok());
    }
}
