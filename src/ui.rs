use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Block, Clear, Paragraph, Row, Table, TableState},
};

use crate::domain::{CMDMode, FtvConfig};
use crate::model::UIData;

pub const CMDLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const TABLE_BORDER_HEIGHT: usize = 2;
pub const COLUMN_WIDTH_MARGIN: usize = 2;

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(5);

pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(cfg: &FtvConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
        }
    }

    pub fn draw(&self, data: &UIData, frame: &mut Frame) {
        let [table_area, cmdline_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(CMDLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_table(data, frame, table_area);
        self.draw_cmdline(data, frame, cmdline_area);

        if data.show_popup {
            self.draw_popup(data, frame);
        }
    }

    fn draw_table(&self, data: &UIData, frame: &mut Frame, area: Rect) {
        let title = if data.name.is_empty() {
            Line::from(" ftv ".bold())
        } else {
            Line::from(format!(" {} [{} films] ", data.name, data.nrows).bold())
        };
        let instructions = Line::from(vec![
            " Sort ".into(),
            "<B>/<Y>".blue().bold(),
            " Search ".into(),
            "</>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let header = Row::new(data.header.clone()).style(Style::new().add_modifier(Modifier::BOLD));
        let rows = data.rows.iter().map(|cells| Row::new(cells.clone()));
        let widths = column_widths(&data.header, &data.rows, self.max_column_width);

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::new().add_modifier(Modifier::REVERSED));

        if data.rows.is_empty() {
            frame.render_widget(table, area);
        } else {
            let mut state = TableState::default().with_selected(Some(data.selected_row));
            frame.render_stateful_widget(table, area, &mut state);
        }
    }

    fn draw_cmdline(&self, data: &UIData, frame: &mut Frame, area: Rect) {
        if data.active_cmdinput {
            let prompt = match data.cmd_mode {
                Some(CMDMode::SearchTitle) => "/",
                None => ":",
            };
            let line = format!("{}{}", prompt, data.cmdinput.input);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position(Position::new(
                area.x + prompt.len() as u16 + data.cmdinput.curser_pos as u16,
                area.y,
            ));
        } else if data.last_status_message_update.elapsed() < STATUS_MESSAGE_TTL {
            frame.render_widget(Paragraph::new(data.status_message.clone()), area);
        } else {
            let position = if data.nrows == 0 {
                " no films".to_string()
            } else {
                format!(" film {}/{}", data.abs_selected_row + 1, data.nrows)
            };
            frame.render_widget(
                Paragraph::new(position).style(Style::new().add_modifier(Modifier::DIM)),
                area,
            );
        }
    }

    fn draw_popup(&self, data: &UIData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 60, 80);
        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .title_bottom(Line::from(" <Esc> to close ").centered());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(data.popup_message.clone()).block(block),
            area,
        );
    }
}

// Widest cell wins, capped so a single long title can not eat the screen.
fn column_widths(header: &[String], rows: &[Vec<String>], max_column_width: usize) -> Vec<Constraint> {
    header
        .iter()
        .enumerate()
        .map(|(cidx, name)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(cidx))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            let width = std::cmp::max(name.chars().count(), widest) + COLUMN_WIDTH_MARGIN;
            Constraint::Length(std::cmp::min(width, max_column_width) as u16)
        })
        .collect()
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, mid, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, mid, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(mid);
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_width_follows_the_widest_cell() {
        let header = vec!["Title".to_string(), "Year".to_string()];
        let rows = vec![
            vec!["Seven Samurai".to_string(), "1954".to_string()],
            vec!["Parasite".to_string(), "2019".to_string()],
        ];
        let widths = column_widths(&header, &rows, 40);
        assert_eq!(
            widths,
            vec![
                Constraint::Length(("Seven Samurai".len() + COLUMN_WIDTH_MARGIN) as u16),
                Constraint::Length(("Year".len() + COLUMN_WIDTH_MARGIN) as u16),
            ]
        );
    }

    #[test]
    fn column_width_is_capped() {
        let header = vec!["Title".to_string()];
        let rows = vec![vec!["x".repeat(200)]];
        let widths = column_widths(&header, &rows, 40);
        assert_eq!(widths, vec![Constraint::Length(40)]);
    }

    #[test]
    fn popup_is_centered() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = popup_area(area, 60, 80);
        assert!(popup.width >= 58 && popup.width <= 62);
        assert!(popup.x >= 18 && popup.x <= 22);
    }
}
