use std::io::Error;

use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum FtvError {
    IoError(Error),
    JsonError(serde_json::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
}

impl From<Error> for FtvError {
    fn from(err: Error) -> Self {
        FtvError::IoError(err)
    }
}

impl From<serde_json::Error> for FtvError {
    fn from(err: serde_json::Error) -> Self {
        FtvError::JsonError(err)
    }
}

#[derive(Debug, Clone)]
pub struct FtvConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    SearchTitle,
}

// Everything the controller can ask the model to do.
#[derive(Debug)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    SortByBoxOffice,
    SortByYear,
    Search,
    Reset,
    CopyRow,
    CopyCell,
    Enter,
    Exit,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "
 ftv - film table viewer

 b              sort by box office (descending)
 y              sort by release year (descending)
 /              search film titles (live, Enter keeps, Esc clears)
 r              reset to the original order
 Enter          open the selected film
 ←/→ or h/l     previous/next film (film view)
 ↑/↓ or k/j     move selection
 PgUp/PgDn      page up/down
 g/G            first/last film
 c              copy selected row (csv)
 C              copy selected title
 ?              this help
 Esc            back / clear
 q              quit
";
