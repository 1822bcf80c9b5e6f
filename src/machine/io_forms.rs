// Primitives for reading the CSV export of a Google Form.

use log::debug;

use csv::StringRecord;
use snafu::prelude::*;

use runoff_tally::RawAssignment;

use crate::machine::*;

/// The recognized choice labels, in rank order. An empty cell means that the
/// candidate was not ranked.
pub const RANK_LABELS: [&str; 5] = [
    "first choice",
    "second choice",
    "third choice",
    "fourth choice",
    "fifth choice",
];

/// The form contents relevant to the tally: the candidate titles and one raw
/// rank assignment per voter, both in input order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormData {
    pub titles: Vec<String>,
    pub assignments: Vec<RawAssignment>,
}

/// Maps a cell to a rank: 0 for an empty cell, 1..=5 for a choice label,
/// `None` for anything else (which disqualifies the whole column).
fn rank_value(cell: &str) -> Option<u32> {
    let c = cell.trim().to_lowercase();
    if c.is_empty() {
        return Some(0);
    }
    RANK_LABELS
        .iter()
        .position(|&label| label == c)
        .map(|idx| (idx + 1) as u32)
}

pub fn read_form_csv(path: &str) -> MachineResult<FormData> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;
    let mut rows: Vec<StringRecord> = Vec::new();
    for record in rdr.into_records() {
        rows.push(record.context(CsvLineParseSnafu {})?);
    }
    let (header, data) = rows.split_first().context(EmptyCsvSnafu { path })?;
    parse_form_rows(header, data)
}

/// Detects the candidate columns and extracts the rank assignments.
///
/// A column is a candidate column iff every data cell in it is empty or a
/// choice label. The first row is the header; the first line of a matching
/// header cell becomes the candidate title. The timestamp column added by
/// Google Forms never qualifies, since its cells are dates.
pub fn parse_form_rows(header: &StringRecord, data: &[StringRecord]) -> MachineResult<FormData> {
    let num_cols = header.len();
    let ranked_cols: Vec<usize> = (0..num_cols)
        .filter(|&col| {
            data.iter()
                .all(|row| row.get(col).map_or(true, |cell| rank_value(cell).is_some()))
        })
        .collect();
    debug!("parse_form_rows: ranked columns: {:?}", ranked_cols);
    ensure!(!ranked_cols.is_empty(), NoCandidateColumnsSnafu {});

    let titles: Vec<String> = ranked_cols
        .iter()
        .map(|&col| {
            let cell = header.get(col).unwrap_or("");
            cell.split('\n').next().unwrap_or("").trim().to_string()
        })
        .collect();

    let assignments: Vec<RawAssignment> = data
        .iter()
        .map(|row| {
            let ranks: Vec<u32> = ranked_cols
                .iter()
                .map(|&col| row.get(col).and_then(rank_value).unwrap_or(0))
                .collect();
            RawAssignment::new(ranks)
        })
        .collect();

    debug!(
        "parse_form_rows: {} titles, {} assignments",
        titles.len(),
        assignments.len()
    );
    Ok(FormData {
        titles,
        assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(input: &str) -> Vec<StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(input.as_bytes())
            .into_records()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn detects_candidate_columns() {
        let rows = records(
            "Timestamp,\"Book A\nSome context\",Book B\n\
             2023/01/05 10:00:00,First choice,Second choice\n\
             2023/01/05 10:05:00,second CHOICE,First choice\n\
             2023/01/05 10:06:00,,Third choice\n",
        );
        let (header, data) = rows.split_first().unwrap();
        let form = parse_form_rows(header, data).unwrap();
        // The timestamp column holds dates and is ignored; a header title
        // keeps only its first line.
        assert_eq!(
            form.titles,
            vec!["Book A".to_string(), "Book B".to_string()]
        );
        assert_eq!(form.assignments.len(), 3);
        assert_eq!(form.assignments[0].ranks, vec![1, 2]);
        assert_eq!(form.assignments[1].ranks, vec![2, 1]);
        assert_eq!(form.assignments[2].ranks, vec![0, 3]);
    }

    #[test]
    fn maps_all_five_labels() {
        let rows = records(
            "A,B,C,D,E\n\
             First choice,Second choice,Third choice,Fourth choice,Fifth choice\n",
        );
        let (header, data) = rows.split_first().unwrap();
        let form = parse_form_rows(header, data).unwrap();
        assert_eq!(form.titles.len(), 5);
        assert_eq!(form.assignments[0].ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn keeps_duplicate_ranks() {
        let rows = records(
            "when,A,B\n\
             2023/01/05,First choice,First choice\n",
        );
        let (header, data) = rows.split_first().unwrap();
        let form = parse_form_rows(header, data).unwrap();
        assert_eq!(form.assignments[0].ranks, vec![1, 1]);
        assert!(form.assignments[0].has_rank_collision());
    }

    #[test]
    fn fails_without_candidate_columns() {
        let rows = records("when,comment\n2023/01/05,hello there\n");
        let (header, data) = rows.split_first().unwrap();
        let res = parse_form_rows(header, data);
        assert!(matches!(res, Err(MachineError::NoCandidateColumns {})));
    }
}
