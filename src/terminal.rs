// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the page in the terminal: the live preview and the snapshot
//! canvas use Unicode half-block characters for double vertical resolution,
//! with their active filter class applied. Keys and mouse clicks become
//! controller messages.

use crate::app::{ElementId, FilterType, Message, PageController};
use crate::constants::timing::UI_POLL_INTERVAL;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph, Widget},
};
use std::io::{self, stdout};
use tracing::{debug, info};

/// Run the interactive page until the user quits
pub fn run(controller: PageController) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, controller);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ToggleHelp,
    Click(ElementId),
}

/// Keyboard shortcuts for the clickable elements
pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('h') => Some(KeyAction::ToggleHelp),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(KeyAction::Click(ElementId::Preview)),
        KeyCode::Char('w') | KeyCode::Enter => Some(KeyAction::Click(ElementId::Canvas)),
        KeyCode::Char('s') => Some(KeyAction::Click(ElementId::SwitchButton)),
        KeyCode::Char('f') => Some(KeyAction::Click(ElementId::VideoFilterTrigger)),
        KeyCode::Char('g') => Some(KeyAction::Click(ElementId::ImageFilterTrigger)),
        _ => None,
    }
}

/// Screen areas of the clickable elements, from the last draw
#[derive(Debug, Clone, Default)]
struct PageLayout {
    targets: Vec<(ElementId, Rect)>,
}

impl PageLayout {
    fn hit(&self, column: u16, row: u16) -> Option<ElementId> {
        let position = Position::new(column, row);
        self.targets
            .iter()
            .find(|(_, rect)| rect.contains(position))
            .map(|(element, _)| *element)
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut controller: PageController,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.update(Message::Init);
    info!(controller = ?controller, "Page initialized");

    let mut show_help = false;

    loop {
        controller.update(Message::Tick);

        let mut layout = PageLayout::default();
        terminal.draw(|f| layout = draw_page(f, &controller, show_help))?;

        // Handle input with timeout for frame updates
        if !event::poll(UI_POLL_INTERVAL)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key_action(&key) {
                Some(KeyAction::Quit) => break,
                Some(KeyAction::ToggleHelp) => show_help = !show_help,
                Some(KeyAction::Click(element)) => {
                    show_help = false;
                    controller.click(element);
                }
                None => {}
            },
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                if let Some(element) = layout.hit(mouse.column, mouse.row) {
                    debug!(element = ?element, "Mouse click");
                    controller.click(element);
                }
            }
            _ => {}
        }
    }

    if let Some(path) = controller.last_saved() {
        info!(path = %path.display(), "Last photo");
    }
    Ok(())
}

fn draw_page(f: &mut Frame, controller: &PageController, show_help: bool) -> PageLayout {
    let page = controller.page();
    let error_height = page.errors.len().min(4) as u16;

    let rows = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(error_height),
        Constraint::Length(1),
    ])
    .split(f.area());
    let panes = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let buttons = Layout::horizontal([
        Constraint::Length(19),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Min(0),
    ])
    .split(rows[1]);

    // Preview
    let preview_block = Block::bordered().title(format!(" {} ", page.preview.classes.as_attribute()));
    let preview_inner = preview_block.inner(panes[0]);
    f.render_widget(preview_block, panes[0]);
    let preview_placeholder = if page.preview.src.is_some() {
        "Waiting for camera..."
    } else {
        "No camera"
    };
    let preview_widget = match &page.preview.frame {
        Some(frame) => ImageWidget::new(
            &frame.data,
            frame.width,
            frame.height,
            page.preview.classes.active_filter(),
        ),
        None => ImageWidget::placeholder(preview_placeholder),
    };
    f.render_widget(preview_widget, preview_inner);

    // Snapshot canvas
    let canvas = &page.canvas;
    let canvas_title = if controller.is_armed(ElementId::Canvas) {
        format!(" {} (click to save) ", canvas.classes.as_attribute())
    } else {
        format!(" {} ", canvas.classes.as_attribute())
    };
    let canvas_block = Block::bordered().title(canvas_title);
    let canvas_inner = canvas_block.inner(panes[1]);
    f.render_widget(canvas_block, panes[1]);
    f.render_widget(
        ImageWidget::new(
            canvas.image().as_raw(),
            canvas.width(),
            canvas.height(),
            canvas.classes.active_filter(),
        ),
        canvas_inner,
    );

    // Buttons and tooltip
    let switch_style = if page.switch_button.disabled {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    f.render_widget(
        Paragraph::new("Switch camera")
            .style(switch_style)
            .block(Block::bordered()),
        buttons[0],
    );
    f.render_widget(
        Paragraph::new("Video filter").block(Block::bordered()),
        buttons[1],
    );
    f.render_widget(
        Paragraph::new("Image filter").block(Block::bordered()),
        buttons[2],
    );
    if let Some(tooltip) = &page.tooltip {
        f.render_widget(
            Paragraph::new(tooltip.as_str()).style(Style::default().fg(Color::Yellow)),
            buttons[3].inner(ratatui::layout::Margin::new(1, 1)),
        );
    }

    // Errors, most recent last
    if error_height > 0 {
        let skip = page.errors.len() - error_height as usize;
        let lines: Vec<Line> = page.errors[skip..]
            .iter()
            .map(|e| Line::from(e.as_str()))
            .collect();
        f.render_widget(
            Paragraph::new(lines).style(Style::default().fg(Color::Red)),
            rows[2],
        );
    }

    // Status
    let message = if show_help {
        build_help_message()
    } else if !page.status.is_empty() {
        page.status.clone()
    } else if let Some(path) = controller.last_saved() {
        format!("Saved: {}", path.display())
    } else {
        build_status_message()
    };
    f.render_widget(StatusBar { message: &message }, rows[3]);

    PageLayout {
        targets: vec![
            (ElementId::Preview, preview_inner),
            (ElementId::Canvas, canvas_inner),
            (ElementId::SwitchButton, buttons[0]),
            (ElementId::VideoFilterTrigger, buttons[1]),
            (ElementId::ImageFilterTrigger, buttons[2]),
        ],
    }
}

fn build_status_message() -> String {
    "'p' capture | 'w' save | 's' switch | 'f'/'g' filters | 'h' help | 'q' quit".to_string()
}

fn build_help_message() -> String {
    "p/Space: Capture | w/Enter: Save | s: Switch camera | f: Video filter | g: Image filter | q/Ctrl+C: Quit"
        .to_string()
}

/// Renders RGBA pixels with half-block characters, letterboxed to the area
struct ImageWidget<'a> {
    pixels: Option<(&'a [u8], u32, u32)>,
    filter: FilterType,
    placeholder: &'a str,
}

impl<'a> ImageWidget<'a> {
    fn new(data: &'a [u8], width: u32, height: u32, filter: FilterType) -> Self {
        Self {
            pixels: Some((data, width, height)),
            filter,
            placeholder: "",
        }
    }

    fn placeholder(message: &'a str) -> Self {
        Self {
            pixels: None,
            filter: FilterType::None,
            placeholder: message,
        }
    }
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some((data, width, height)) = self.pixels.filter(|(_, w, h)| *w > 0 && *h > 0) else {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        let Some((display_width, display_height)) = fit_to_area(width, height, area) else {
            return;
        };

        // Filter after scaling; only blur needs to know the scale
        let scaled = downscale(data, width, height, display_width as u32, display_height as u32 * 2);
        let scale = display_width as f32 / width as f32;
        let filtered = self.filter.apply_at_scale(&scaled, scale);

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let top = filtered.get_pixel(tx as u32, ty as u32 * 2).0;
                let bottom = filtered.get_pixel(tx as u32, ty as u32 * 2 + 1).0;
                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(top[0], top[1], top[2]));
                    cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// Display size in cells, keeping the aspect ratio (each cell is two pixels tall)
fn fit_to_area(width: u32, height: u32, area: Rect) -> Option<(u16, u16)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    let frame_aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    let (w, h) = if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        (term_height * frame_aspect, term_height)
    } else {
        // Terminal is taller - fit to width
        (term_width, term_width / frame_aspect)
    };

    let cells_w = (w as u16).clamp(1, area.width);
    let cells_h = ((h / 2.0) as u16).clamp(1, area.height);
    Some((cells_w, cells_h))
}

/// Nearest-neighbour downscale of tightly packed RGBA
fn downscale(data: &[u8], width: u32, height: u32, out_w: u32, out_h: u32) -> RgbaImage {
    let x_scale = width as f64 / out_w as f64;
    let y_scale = height as f64 / out_h as f64;

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let src_x = ((x as f64 * x_scale) as u32).min(width - 1);
        let src_y = ((y as f64 * y_scale) as u32).min(height - 1);
        let idx = ((src_y * width + src_x) * 4) as usize;
        match data.get(idx..idx + 4) {
            Some(px) => image::Rgba([px[0], px[1], px[2], px[3]]),
            None => image::Rgba([0, 0, 0, 255]),
        }
    })
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
