/*!

# Manual

This is the long-form manual for `runoff_tally` and the `rcvmachine` command
line program.

## Collecting votes with Google Forms

The expected workflow uses a Google Form with one **Multiple Choice Grid**
question per election: the rows are the candidates, the columns are the
choice levels (`First choice` up to `Fifth choice`). Voters tick one column
per candidate; nothing forces them to use each choice level exactly once,
which is why the normalizer below has to repair duplicate ranks.

After the poll closes, export the responses as a CSV file from the attached
spreadsheet and run:

```bash
rcvmachine --input responses.csv
```

The program detects the candidate columns on its own: a column counts as a
candidate iff every one of its cells is either empty or one of the choice
labels. The first line of the column header is used as the candidate title.
The timestamp column (and any free-form question) never matches and is
ignored.

## Repairing improper votes

A voter who gives the same choice level to several candidates has not cast a
valid ranking. Rather than discarding the ballot, the normalizer resolves
each collision with one of two policies, chosen by the operator:

* **randomize**: pick among the colliding candidates with a seeded
  digest-based draw (reproducible with `--seed`);
* **align with voter N**: adopt the relative order that voter `N` (who must
  have voted properly) gave to the colliding candidates. When that voter
  ranked none of them, the draw decides and a warning is reported.

## The tallying algorithm

Each round counts first preferences over the ballots that still have one. A
candidate holding strictly more than half of those counts wins immediately.
Otherwise every candidate strictly below the round's maximum count is
eliminated at once and the round repeats.

Note that this batch rule deviates from textbook instant-runoff voting,
which eliminates only the weakest candidate each round; the two disagree on
some inputs and this crate intentionally keeps the batch behavior.

When all first-preference counts are equal, ballots are re-scored with
geometrically decaying credit (1 for the first remaining choice, 1/2 for the
second, 1/4 for the third, ...). If the scores distinguish the tied
candidates, the trailing ones are eliminated and the rounds continue; if
not, the tie is final and covers every candidate holding any score.

The full ranking repeats the whole procedure with already-ranked candidates
excluded, so a tie of width `w` at rank `r` makes the next declared rank
`r + w`.

*/
