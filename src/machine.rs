use log::{debug, info};

use runoff_tally::*;
use snafu::{prelude::*, Snafu};

use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;

pub mod io_forms;
pub mod table;

use crate::args::Args;
use crate::machine::io_forms::{read_form_csv, FormData};
use crate::machine::table::render_vote_table;

#[derive(Debug, Snafu)]
pub enum MachineError {
    #[snafu(display("Error opening CSV file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error parsing a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("The file {path} contains no rows"))]
    EmptyCsv { path: String },
    #[snafu(display("No candidate columns were detected in the input"))]
    NoCandidateColumns {},
    #[snafu(display(
        "Invalid tie-break directive {directive:?}: expected 'r' or a voter number between 1 and {num_voters}"
    ))]
    InvalidTieBreak {
        directive: String,
        num_voters: usize,
    },
    #[snafu(display("Voter {voter} voted improperly and cannot be aligned with"))]
    NaughtyReferenceVoter { voter: usize },
    #[snafu(display("Error reading the answer"))]
    ReadingAnswer { source: std::io::Error },
    #[snafu(display("The input ended before an acceptable answer was given"))]
    EndOfInput {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary { source: std::io::Error, path: String },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Voting error: {source}"))]
    Tally { source: VotingErrors },
}

pub type MachineResult<T> = Result<T, MachineError>;

const WELCOME: &str = "
Welcome to the ranked-choice voting machine!

Prepare yourself.

This voting machine assumes that:
 * We're working with a CSV file from Google forms.
 * The questions all begin with the title of the candidates.
   Specifically, the first line of each question is used as a title.
 * The ranked choice votes are of the form 'First choice'
   up through a maximum of 'Fifth choice'. Case doesn't matter.
";

/// Asks on the standard output until `is_acceptable` accepts an answer read
/// from the standard input.
fn get_acceptable_answer<F>(prompt: &str, is_acceptable: F) -> MachineResult<String>
where
    F: Fn(&str) -> bool,
{
    let stdin = std::io::stdin();
    loop {
        print!("{}", prompt);
        std::io::stdout().flush().context(ReadingAnswerSnafu {})?;
        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context(ReadingAnswerSnafu {})?;
        ensure!(read > 0, EndOfInputSnafu {});
        let answer = line.trim().to_string();
        if is_acceptable(&answer) {
            return Ok(answer);
        }
    }
}

/// The opening ritual: make sure the operator did not forget to cast their
/// own vote before tallying everyone else's.
fn confirm_operator_voted() -> MachineResult<bool> {
    println!("First things first.");
    let answer = get_acceptable_answer("Did you remember to vote? [y]es / [n]o ", |inp| {
        matches!(inp.to_lowercase().as_str(), "y" | "n")
    })?;
    if answer.eq_ignore_ascii_case("n") {
        println!("Ruh-roh. Please go vote, using the same Google form. Then run this on the new data!");
        Ok(false)
    } else {
        println!("\nPhew, I was nervous about that. Good job.\n");
        Ok(true)
    }
}

/// Parses a tie-break directive: 'r' for randomized repair, or a 1-indexed
/// voter number for alignment with that voter. The referenced voter must
/// itself have voted properly.
fn parse_tie_break(
    directive: &str,
    assignments: &[RawAssignment],
) -> MachineResult<TieBreakPolicy> {
    let d = directive.trim();
    if d.eq_ignore_ascii_case("r") {
        return Ok(TieBreakPolicy::Randomized);
    }
    let num_voters = assignments.len();
    let voter: usize = d
        .parse()
        .ok()
        .filter(|v| (1..=num_voters).contains(v))
        .context(InvalidTieBreakSnafu {
            directive: d,
            num_voters,
        })?;
    ensure!(
        !assignments[voter - 1].has_rank_collision(),
        NaughtyReferenceVoterSnafu { voter }
    );
    Ok(TieBreakPolicy::AlignWithVoter(voter - 1))
}

/// Picks the repair policy: the --tie-break flag if present, otherwise an
/// interactive prompt when improper votes call for one.
fn resolve_policy(
    args: &Args,
    assignments: &[RawAssignment],
    any_naughty: bool,
) -> MachineResult<TieBreakPolicy> {
    if let Some(directive) = &args.tie_break {
        return parse_tie_break(directive, assignments);
    }
    if !any_naughty || args.no_prompt {
        // Randomized is a reasonable default when all votes are proper: the
        // normalizer never consults it on collision-free input.
        return Ok(TieBreakPolicy::Randomized);
    }
    let prompt = format!(
        "How shall I fix naughty votes? [r]andomize within conflicts / [1-{}] resolve conflicts by aligning with another voter ",
        assignments.len()
    );
    let answer = get_acceptable_answer(&prompt, |inp| match parse_tie_break(inp, assignments) {
        Ok(_) => true,
        Err(MachineError::NaughtyReferenceVoter { .. }) => {
            println!("To align with a voter, please choose a non-naughty voter.");
            false
        }
        Err(_) => false,
    })?;
    parse_tie_break(&answer, assignments)
}

/// Projects a normalized ballot back onto the rank-per-candidate layout so
/// the adjusted votes can be displayed in the same table as the raw ones.
fn ballot_to_assignment(ballot: &Ballot, num_candidates: usize) -> RawAssignment {
    let mut ranks = vec![0u32; num_candidates];
    for (pos, cid) in ballot.choices.iter().enumerate() {
        ranks[cid.0 as usize] = (pos + 1) as u32;
    }
    RawAssignment::new(ranks)
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct OutputConfig {
    source: String,
    candidates: Vec<String>,
    #[serde(rename = "tieBreak")]
    tie_break: String,
    seed: u32,
}

fn candidate_names(titles: &[String], cids: &BTreeSet<CandidateId>) -> Vec<String> {
    cids.iter()
        .map(|cid| titles[cid.0 as usize].clone())
        .collect()
}

fn build_summary_js(
    args: &Args,
    titles: &[String],
    policy: TieBreakPolicy,
    result: &TallyResult,
) -> JSValue {
    let config = OutputConfig {
        source: args.input.clone(),
        candidates: titles.to_vec(),
        tie_break: match policy {
            TieBreakPolicy::Randomized => "randomize".to_string(),
            TieBreakPolicy::AlignWithVoter(v) => format!("align with voter {}", v + 1),
        },
        seed: args.seed,
    };
    let ranking: Vec<JSValue> = result
        .ranking
        .iter()
        .map(|entry| {
            json!({
                "rank": entry.rank,
                "tie": entry.tied,
                "candidates": candidate_names(titles, &entry.candidates),
            })
        })
        .collect();
    json!({
        "config": config,
        "results": {
            "firstPlace": candidate_names(titles, &result.first_place.winners),
            "status": match result.first_place.status {
                WinnerStatus::Majority => "majority",
                WinnerStatus::Tied => "tie",
            },
            "ranking": ranking,
        }
    })
}

fn write_summary(
    out: &str,
    args: &Args,
    titles: &[String],
    policy: TieBreakPolicy,
    result: &TallyResult,
) -> MachineResult<()> {
    let js = build_summary_js(args, titles, policy, result);
    let pretty = serde_json::to_string_pretty(&js).context(SerializingSummarySnafu {})?;
    if out == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(out, pretty).context(WritingSummarySnafu { path: out })?;
        info!("write_summary: wrote the summary to {}", out);
    }
    Ok(())
}

pub fn run_machine(args: &Args) -> MachineResult<()> {
    println!("{}", WELCOME);

    if !args.no_prompt && !confirm_operator_voted()? {
        return Ok(());
    }

    let FormData {
        titles,
        assignments,
    } = read_form_csv(&args.input)?;
    info!(
        "run_machine: {} voters, {} candidates",
        assignments.len(),
        titles.len()
    );

    println!("I believe the candidate titles are:\n");
    for (i, title) in titles.iter().enumerate() {
        println!("{:5}. {}", i + 1, title);
    }

    let flagged: Vec<bool> = assignments
        .iter()
        .map(|a| a.has_rank_collision())
        .collect();
    let any_naughty = flagged.iter().any(|&f| f);
    debug!("run_machine: naughty voters: {:?}", flagged);

    println!("\nHere are the raw votes. Each row is a single voter.\n");
    print!("{}", render_vote_table(&assignments, &flagged));
    println!();

    let policy = resolve_policy(args, &assignments, any_naughty)?;
    let mut picker = HashPicker::new(args.seed);
    let result = run_tally(&assignments, policy, &mut picker).context(TallySnafu {})?;

    for (voter, warning) in result.warnings.iter() {
        println!("Warning: voter {}: {}.", voter + 1, warning);
    }

    if any_naughty {
        println!("Adjusted votes:\n");
        let adjusted: Vec<RawAssignment> = result
            .ballots
            .iter()
            .map(|b| ballot_to_assignment(b, titles.len()))
            .collect();
        let all_clean = vec![false; adjusted.len()];
        print!("{}", render_vote_table(&adjusted, &all_clean));
        println!();
    }

    match result.first_place.status {
        WinnerStatus::Majority => println!("First place winner:"),
        WinnerStatus::Tied => println!("First place winners (tie):"),
    }
    for cid in result.first_place.winners.iter() {
        println!("{}", titles[cid.0 as usize]);
    }

    println!("\nFull ranking of all candidates:");
    for entry in result.ranking.iter() {
        let tie_str = if entry.tied { "(tie)" } else { "     " };
        for cid in entry.candidates.iter() {
            println!("{:2}. {} {}", entry.rank, tie_str, titles[cid.0 as usize]);
        }
    }

    println!("\nThanks for using the ranked-choice voting machine!\n");

    if let Some(out) = &args.out {
        write_summary(out, args, &titles, policy, &result)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignments() -> Vec<RawAssignment> {
        vec![
            RawAssignment::new(vec![1, 2, 0]),
            RawAssignment::new(vec![1, 1, 2]),
        ]
    }

    #[test]
    fn tie_break_randomize() {
        let policy = parse_tie_break("r", &assignments()).unwrap();
        assert_eq!(policy, TieBreakPolicy::Randomized);
        let policy = parse_tie_break(" R ", &assignments()).unwrap();
        assert_eq!(policy, TieBreakPolicy::Randomized);
    }

    #[test]
    fn tie_break_alignment_is_zero_indexed() {
        let policy = parse_tie_break("1", &assignments()).unwrap();
        assert_eq!(policy, TieBreakPolicy::AlignWithVoter(0));
    }

    #[test]
    fn tie_break_rejects_bad_directives() {
        assert!(matches!(
            parse_tie_break("0", &assignments()),
            Err(MachineError::InvalidTieBreak { .. })
        ));
        assert!(matches!(
            parse_tie_break("3", &assignments()),
            Err(MachineError::InvalidTieBreak { .. })
        ));
        assert!(matches!(
            parse_tie_break("first", &assignments()),
            Err(MachineError::InvalidTieBreak { .. })
        ));
    }

    #[test]
    fn tie_break_rejects_naughty_reference() {
        // Voter 2 has a rank collision and cannot serve as the reference.
        assert!(matches!(
            parse_tie_break("2", &assignments()),
            Err(MachineError::NaughtyReferenceVoter { voter: 2 })
        ));
    }

    #[test]
    fn adjusted_votes_round_trip() {
        let ballot = Ballot {
            choices: vec![CandidateId(2), CandidateId(0)],
        };
        let raw = ballot_to_assignment(&ballot, 4);
        assert_eq!(raw.ranks, vec![2, 0, 1, 0]);
    }
}
