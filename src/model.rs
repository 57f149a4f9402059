use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::cmp::min;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, trace};

use crate::domain::{CMDMode, FtvError, HELP_TEXT, Message};
use crate::film::{self, Film};
use crate::inputter::{InputResult, Inputter};
use crate::ui::{CMDLINE_HEIGHT, TABLE_BORDER_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    TABLE,
    RECORD,
    POPUP,
    CMDINPUT,
}

// Everything the UI needs for one frame. The UI never reaches back into
// the model.
pub struct UIData {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub nrows: usize, // Total number of rows in the current view
    pub selected_row: usize,
    pub abs_selected_row: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub last_update: Instant,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            header: film::HEADER.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
            nrows: 0,
            selected_row: 0,
            abs_selected_row: 0,
            show_popup: false,
            popup_message: String::new(),
            last_update: Instant::now(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_height =
            ui_height.saturating_sub(TABLE_HEADER_HEIGHT + TABLE_BORDER_HEIGHT + CMDLINE_HEIGHT);
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    films: Vec<Film>, // The loaded dataset, never touched after load
    name: String,
    view: Vec<usize>, // Mapping of view row index to film index
    curser_row: usize,
    offset_row: usize,
    record_idx: usize, // View position shown in the record view
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            status: Status::EMPTY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            films: Vec::new(),
            name: String::new(),
            view: Vec::new(),
            curser_row: 0,
            offset_row: 0,
            record_idx: 0,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: Clipboard::new().ok(),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            status_message: "Started ftv!".to_string(),
            last_status_message_update: Instant::now(),
        };
        model.update_table_data();
        model
    }

    pub fn load_data_file(&mut self, path: PathBuf) -> Result<bool, FtvError> {
        let start_time = Instant::now();
        let films = film::load_films(&path)?;
        let data_loading_duration = start_time.elapsed().as_millis();

        self.name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        self.view = film::identity(&films);
        self.films = films;
        self.status = Status::READY;
        self.reset_curser();
        self.set_status_message(format!(
            "Loaded {} films in {}ms ...",
            self.films.len(),
            data_loading_duration
        ));
        self.update_table_data();
        Ok(true)
    }

    // A failed load leaves the table empty, details are in the log.
    pub fn report_load_failure(&mut self, path: &Path) {
        self.set_status_message(format!("Loading {} failed (see ftv.log)", path.display()));
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), FtvError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_selection_down(1),
                Message::MoveUp => self.move_selection_up(1),
                Message::MovePageDown => self.move_selection_down(self.page_size()),
                Message::MovePageUp => self.move_selection_up(self.page_size()),
                Message::MoveBeginning => self.move_selection_beginning(),
                Message::MoveEnd => self.move_selection_end(),
                Message::SortByBoxOffice => self.sort_by_box_office(),
                Message::SortByYear => self.sort_by_year(),
                Message::Search => self.enter_cmd_mode(CMDMode::SearchTitle),
                Message::Reset => self.reset_view(),
                Message::CopyRow => self.copy_selected_row(),
                Message::CopyCell => self.copy_selected_cell(),
                Message::Enter => self.enter(),
                Message::Exit => self.exit(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::RECORD => match message {
                Message::Quit => self.quit(),
                Message::MoveLeft | Message::MoveUp => self.previous_record(),
                Message::MoveRight | Message::MoveDown => self.next_record(),
                Message::CopyRow => self.copy_selected_row(),
                Message::CopyCell => self.copy_selected_cell(),
                Message::Exit => self.exit(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => match message {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }
        Ok(())
    }

    // -------------------- View derivation ---------------------- //

    fn sort_by_box_office(&mut self) {
        // Derived from the full dataset, an active filter is dropped.
        self.view = film::sorted_by_box_office(&self.films);
        self.reset_curser();
        self.set_status_message("Sorted by box office (descending)");
        self.update_table_data();
    }

    fn sort_by_year(&mut self) {
        self.view = film::sorted_by_year(&self.films);
        self.reset_curser();
        self.set_status_message("Sorted by release year (descending)");
        self.update_table_data();
    }

    fn apply_title_filter(&mut self, term: &str) {
        let start_time = Instant::now();
        self.view = film::filter_by_title(&self.films, term);
        trace!(
            "Filter \"{}\" matched {} of {} films in {}ms",
            term,
            self.view.len(),
            self.films.len(),
            start_time.elapsed().as_millis()
        );
        self.reset_curser();
        self.update_table_data();
    }

    fn reset_view(&mut self) {
        self.view = film::identity(&self.films);
        self.reset_curser();
        self.set_status_message(format!("Showing all {} films", self.films.len()));
        self.update_table_data();
    }

    // -------------------- UIData construction ---------------------- //

    fn update_table_data(&mut self) {
        // Keep the curser inside a possibly shrunken view
        if self.view.is_empty() {
            self.offset_row = 0;
            self.curser_row = 0;
        } else {
            let max_abs = self.view.len() - 1;
            self.offset_row = min(self.offset_row, max_abs);
            let max_curser = min(
                self.uilayout.table_height.max(1) - 1,
                max_abs - self.offset_row,
            );
            self.curser_row = min(self.curser_row, max_curser);
        }
        self.update_uidata_for_table();
    }

    fn update_uidata_for_table(&mut self) {
        let rbegin = min(self.offset_row, self.view.len());
        let rend = min(rbegin + self.uilayout.table_height, self.view.len());
        trace!(
            "Table: Cr {}, Or {}, Rb {}, Re {}, rows {}",
            self.curser_row,
            self.offset_row,
            rbegin,
            rend,
            self.view.len()
        );

        self.uidata = UIData {
            name: self.name.clone(),
            header: film::HEADER.iter().map(|s| s.to_string()).collect(),
            rows: film::rows(&self.films, &self.view[rbegin..rend]),
            nrows: self.view.len(),
            selected_row: self.curser_row,
            abs_selected_row: self.offset_row + self.curser_row,
            show_popup: false,
            popup_message: String::new(),
            last_update: Instant::now(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }

    fn update_record_data(&mut self) {
        let Some(&film_idx) = self.view.get(self.record_idx) else {
            return;
        };
        let cells = film::row(&self.films[film_idx]);
        let rows: Vec<Vec<String>> = film::HEADER
            .iter()
            .zip(cells)
            .map(|(name, value)| vec![name.to_string(), value])
            .collect();

        self.uidata = UIData {
            name: format!("R[{}]", self.name),
            header: vec!["Field".to_string(), "Value".to_string()],
            rows,
            nrows: self.view.len(),
            selected_row: 0,
            // Which film we are looking at instead of a line position
            abs_selected_row: self.record_idx,
            show_popup: false,
            popup_message: String::new(),
            last_update: Instant::now(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
        self.uidata.last_update = Instant::now();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        match self.modus {
            Modus::TABLE | Modus::CMDINPUT => self.update_table_data(),
            Modus::RECORD => self.update_record_data(),
            Modus::POPUP => {}
        }
    }

    // -------------------- Control handling ---------------------- //

    fn enter(&mut self) {
        if self.view.is_empty() {
            return;
        }
        self.record_idx = self.offset_row + self.curser_row;
        self.previous_modus = Modus::TABLE;
        self.modus = Modus::RECORD;
        self.update_record_data();
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::TABLE => self.reset_view(),
            Modus::RECORD => {
                self.previous_modus = Modus::RECORD;
                self.modus = Modus::TABLE;
                self.update_table_data();
            }
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.uidata.show_popup = false;
                self.uidata.last_update = Instant::now();
            }
            Modus::CMDINPUT => {}
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
        self.uidata.last_update = Instant::now();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();

        self.uidata.cmdinput = self.last_input.clone();
        self.uidata.cmd_mode = self.cmd_mode;
        self.uidata.active_cmdinput = self.active_cmdinput;
        self.uidata.last_update = Instant::now();
    }

    fn leave_cmd_mode(&mut self) {
        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        self.cmd_mode = None;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);
        let result = self.last_input.clone();
        match self.cmd_mode {
            Some(CMDMode::SearchTitle) => {
                if result.canceled {
                    self.leave_cmd_mode();
                    self.reset_view();
                    return;
                }
                // Filter on every keystroke, like typing into a search box.
                // The term always runs against the full dataset.
                self.apply_title_filter(&result.input);
                if result.finished {
                    self.leave_cmd_mode();
                    self.set_status_message(format!(
                        "{} of {} films match \"{}\"",
                        self.view.len(),
                        self.films.len(),
                        result.input
                    ));
                    self.update_table_data();
                }
            }
            None => self.leave_cmd_mode(),
        }
    }

    // -------------------- Selection ---------------------- //

    fn page_size(&self) -> usize {
        self.uilayout.table_height.max(1)
    }

    fn set_abs_selection(&mut self, abs: usize) {
        let height = self.uilayout.table_height.max(1);
        if abs >= self.offset_row && abs < self.offset_row + height {
            self.curser_row = abs - self.offset_row;
        } else if abs < self.offset_row {
            self.offset_row = abs;
            self.curser_row = 0;
        } else {
            self.curser_row = height - 1;
            self.offset_row = abs - self.curser_row;
        }
        self.update_table_data();
    }

    fn move_selection_up(&mut self, size: usize) {
        if self.view.is_empty() {
            return;
        }
        let new_abs = (self.offset_row + self.curser_row).saturating_sub(size);
        self.set_abs_selection(new_abs);
    }

    fn move_selection_down(&mut self, size: usize) {
        if self.view.is_empty() {
            return;
        }
        let max_abs = self.view.len() - 1;
        let new_abs = min(self.offset_row + self.curser_row + size, max_abs);
        self.set_abs_selection(new_abs);
    }

    fn move_selection_beginning(&mut self) {
        if self.view.is_empty() {
            return;
        }
        self.set_abs_selection(0);
    }

    fn move_selection_end(&mut self) {
        if self.view.is_empty() {
            return;
        }
        self.set_abs_selection(self.view.len() - 1);
    }

    fn previous_record(&mut self) {
        self.record_idx = self.record_idx.saturating_sub(1);
        self.update_record_data();
    }

    fn next_record(&mut self) {
        if self.record_idx + 1 < self.view.len() {
            self.record_idx += 1;
        }
        self.update_record_data();
    }

    // -------------------- Clipboard ---------------------- //

    fn selected_film(&self) -> Option<&Film> {
        let abs = match self.modus {
            Modus::RECORD => self.record_idx,
            _ => self.offset_row + self.curser_row,
        };
        self.view.get(abs).map(|&idx| &self.films[idx])
    }

    fn copy_selected_row(&mut self) {
        let Some(film) = self.selected_film() else {
            return;
        };
        let content = film::row(film)
            .iter()
            .map(|cell| Model::wrap_cell_content(cell))
            .collect::<Vec<String>>()
            .join(",");
        self.copy_to_clipboard(content);
    }

    fn copy_selected_cell(&mut self) {
        let Some(film) = self.selected_film() else {
            return;
        };
        let title = film.title.clone();
        self.copy_to_clipboard(title);
    }

    fn copy_to_clipboard(&mut self, content: String) {
        trace!("Copying: {}", content);
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(content).map_err(|e| format!("{e:?}")),
            None => Err("no clipboard available".to_string()),
        };
        match result {
            Ok(_) => self.set_status_message("Copied to clipboard"),
            Err(e) => {
                error!("Copying to clipboard failed: {}", e);
                self.set_status_message("Copying to clipboard failed");
            }
        }
    }

    fn wrap_cell_content(cell: &str) -> String {
        let needs_escaping = cell.chars().any(|c| c == '"');
        let needs_wrapping = cell.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(cell);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn reset_curser(&mut self) {
        self.curser_row = 0;
        self.offset_row = 0;
        self.record_idx = 0;
    }
}
