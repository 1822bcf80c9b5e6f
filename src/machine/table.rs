// Plain-text rendering of the vote table.

use runoff_tally::RawAssignment;

/// Renders a human-friendly table of the rank assignments: candidates as
/// numbered columns, one row per voter, a blank cell for an unranked
/// candidate and a trailing `*` for flagged (improperly voting) voters.
pub fn render_vote_table(assignments: &[RawAssignment], flagged: &[bool]) -> String {
    let num_candidates = assignments.first().map_or(0, |a| a.ranks.len());
    let mut out = String::new();

    out.push_str("    cand |");
    for c in 0..num_candidates {
        out.push_str(&format!("{:3}", c + 1));
    }
    out.push('\n');
    out.push_str(&"_".repeat(4 * num_candidates + 9));
    out.push('\n');

    for (i, assignment) in assignments.iter().enumerate() {
        out.push_str(&format!("voter {:2} |", i + 1));
        for &rank in assignment.ranks.iter() {
            if rank == 0 {
                out.push_str("   ");
            } else {
                out.push_str(&format!("{:3}", rank));
            }
        }
        if flagged.get(i).copied().unwrap_or(false) {
            out.push_str("  *");
        }
        out.push('\n');
    }

    if flagged.iter().any(|&f| f) {
        out.push('\n');
        out.push_str(
            "* Indicates a naughty voter = someone has given multiple votes to the same choice!\n",
        );
        out.push_str("  (gasp)\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_ranks_and_blanks() {
        let assignments = vec![
            RawAssignment::new(vec![1, 0, 2]),
            RawAssignment::new(vec![2, 2, 1]),
        ];
        let flagged = vec![false, true];
        let table = render_vote_table(&assignments, &flagged);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "    cand |  1  2  3");
        assert_eq!(lines[1], "_".repeat(21));
        assert_eq!(lines[2], "voter  1 |  1     2");
        assert_eq!(lines[3], "voter  2 |  2  2  1  *");
        // The footnote shows up only when a voter is flagged.
        assert!(table.contains("naughty voter"));
    }

    #[test]
    fn no_footnote_without_flags() {
        let assignments = vec![RawAssignment::new(vec![1, 2])];
        let table = render_vote_table(&assignments, &[false]);
        assert!(!table.contains('*'));
    }
}
