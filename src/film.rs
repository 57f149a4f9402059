use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::FtvError;

/// One film record as it appears in the JSON dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Film {
    pub title: String,
    pub release_year: i64,
    pub director: String,
    pub box_office: u64,
    pub country: String,
}

pub const HEADER: [&str; 5] = ["Title", "Year", "Director", "Box office", "Country"];

pub fn load_films(path: &Path) -> Result<Vec<Film>, FtvError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FtvError::FileNotFound,
        ErrorKind::PermissionDenied => FtvError::PermissionDenied,
        _ => FtvError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(FtvError::LoadingFailed("Not a file!".into()));
    }

    let raw = fs::read_to_string(path)?;
    let films: Vec<Film> = serde_json::from_str(&raw)?;
    info!("Loaded {} film records from {}", films.len(), path.display());
    for film in films.iter() {
        debug!("Film: {:?}", film);
    }
    Ok(films)
}

// All transforms return a row mapping (view index -> film index) so the
// loaded records are never cloned or reordered. Every mapping is derived
// from the full dataset, not from a previous mapping.

pub fn identity(films: &[Film]) -> Vec<usize> {
    (0..films.len()).collect()
}

// Order of equal keys is implementation defined.
pub fn sorted_by_box_office(films: &[Film]) -> Vec<usize> {
    let mut rows = identity(films);
    rows.sort_by(|&a, &b| films[b].box_office.cmp(&films[a].box_office));
    rows
}

pub fn sorted_by_year(films: &[Film]) -> Vec<usize> {
    let mut rows = identity(films);
    rows.sort_by(|&a, &b| films[b].release_year.cmp(&films[a].release_year));
    rows
}

// Case insensitive substring match on the title. The empty term matches
// every film. Matches keep their original relative order.
pub fn filter_by_title(films: &[Film], term: &str) -> Vec<usize> {
    let term = term.to_lowercase();
    films
        .iter()
        .enumerate()
        .filter(|(_, film)| film.title.to_lowercase().contains(&term))
        .map(|(idx, _)| idx)
        .collect()
}

pub fn format_box_office(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}")
}

// Fixed column order, independent of any sort or filter state.
pub fn row(film: &Film) -> Vec<String> {
    vec![
        film.title.clone(),
        film.release_year.to_string(),
        film.director.clone(),
        format_box_office(film.box_office),
        film.country.clone(),
    ]
}

// Projects every mapped record, one row per entry. Fitting this onto a
// screen is the callers problem.
pub fn rows(films: &[Film], mapping: &[usize]) -> Vec<Vec<String>> {
    mapping.iter().map(|&idx| row(&films[idx])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Vec<Film> {
        vec![
            Film {
                title: "Alpha".to_string(),
                release_year: 1995,
                director: "A. Director".to_string(),
                box_office: 100,
                country: "USA".to_string(),
            },
            Film {
                title: "Beta".to_string(),
                release_year: 2010,
                director: "B. Director".to_string(),
                box_office: 300,
                country: "France".to_string(),
            },
            Film {
                title: "Gamma Male".to_string(),
                release_year: 2003,
                director: "C. Director".to_string(),
                box_office: 200,
                country: "Japan".to_string(),
            },
        ]
    }

    #[test]
    fn loads_fixture() {
        let films = load_films(Path::new("tests/fixtures/films_01.json")).unwrap();
        assert_eq!(films.len(), 8);
        assert_eq!(films[0].title, "The Godfather");
        assert_eq!(films[0].release_year, 1972);
        assert_eq!(films[0].box_office, 250000000);
        assert_eq!(films[4].country, "Japan");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_films(Path::new("tests/fixtures/no_such_file.json")).unwrap_err();
        assert!(matches!(err, FtvError::FileNotFound));
    }

    #[test]
    fn load_reports_malformed_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ this is not a film list ]").unwrap();
        let err = load_films(file.path()).unwrap_err();
        assert!(matches!(err, FtvError::JsonError(_)));
    }

    #[test]
    fn load_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_films(dir.path()).unwrap_err();
        assert!(matches!(err, FtvError::LoadingFailed(_)));
    }

    #[test]
    fn box_office_sort_is_descending() {
        let films = sample();
        let rows = sorted_by_box_office(&films);
        assert_eq!(rows, vec![1, 2, 0]);
        let values: Vec<u64> = rows.iter().map(|&i| films[i].box_office).collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn year_sort_is_descending() {
        let films = sample();
        let rows = sorted_by_year(&films);
        assert_eq!(rows, vec![1, 2, 0]);
    }

    #[test]
    fn sorting_twice_changes_nothing() {
        let films = sample();
        let once = sorted_by_box_office(&films);
        let twice = sorted_by_box_office(&films);
        assert_eq!(once, twice);
    }

    #[test]
    fn sorting_leaves_the_dataset_alone() {
        let films = sample();
        let before = films.clone();
        let _ = sorted_by_box_office(&films);
        let _ = sorted_by_year(&films);
        let _ = filter_by_title(&films, "alp");
        assert_eq!(films, before);
    }

    #[test]
    fn filter_matches_substrings_case_insensitive() {
        let films = sample();
        assert_eq!(filter_by_title(&films, "al"), vec![0, 2]);
        assert_eq!(filter_by_title(&films, "ALPHA"), vec![0]);
        assert_eq!(filter_by_title(&films, "nothing"), Vec::<usize>::new());
    }

    #[test]
    fn filter_with_empty_term_matches_all() {
        let films = sample();
        assert_eq!(filter_by_title(&films, ""), vec![0, 1, 2]);
    }

    #[test]
    fn box_office_formatting() {
        assert_eq!(format_box_office(0), "$0");
        assert_eq!(format_box_office(100), "$100");
        assert_eq!(format_box_office(1000), "$1,000");
        assert_eq!(format_box_office(1234567), "$1,234,567");
        assert_eq!(format_box_office(380000000), "$380,000,000");
    }

    #[test]
    fn rows_project_every_mapped_record() {
        let films = sample();
        let projected = rows(&films, &identity(&films));
        assert_eq!(projected.len(), films.len());
        assert_eq!(
            projected[0],
            vec!["Alpha", "1995", "A. Director", "$100", "USA"]
        );
        assert_eq!(projected[1][3], "$300");

        let sorted = rows(&films, &sorted_by_box_office(&films));
        assert_eq!(sorted[0][0], "Beta");
        assert_eq!(sorted[2][0], "Alpha");
    }
}
