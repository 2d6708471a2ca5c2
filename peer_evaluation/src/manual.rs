/*!

This is the long-form manual for `peer_evaluation` and `peereval`.

## How it works

1. every student fills in a copy of the evaluation form (an Excel `.xlsx` file) and hands it in
2. `peereval` searches a directory, and all its sub-directories, for the completed forms
3. the records are concatenated and checked by group and by respondent
4. a Peer Evaluation Multiplier (PEM) is computed for every member of every group
5. all the records are written to CSV files

## The form

The form is a fixed template. Only the following cells are read (Excel notation):

| field                         | cells     |
|-------------------------------|-----------|
| respondent (who fills it in)  | `C4`      |
| group                         | `C6`      |
| feedback on the group         | `L11`     |
| names of the team members     | `B19:B26` |
| ratings, criteria q1 to q7    | `C19:I26` |
| comments on each team member  | `L19:L26` |

The respondent is expected to list every member of the group, including themselves.
Rows that are entirely blank are ignored: they are the unused slots of groups with fewer
than eight members. The average column of the template (`K`) is ignored and recomputed.

Identifiers may be typed as numbers (a group `3` is read as `3`, not `3.0`).

## Checks

The forms are not corrected: problems are reported so that they can be fixed by hand.
The roster of a group is taken to be the set of respondents for this group. For each form:

- `RosterMismatch`: the members listed are not exactly the roster
- `MissingRows`: the number of rows differs from the size of the roster, or is lower
  than the minimum group size (2 by default)
- `MissingCriteria`: some ratings are blank
- `ScoreOutOfRange`: some ratings are outside of the valid range (1 to 5 by default)

Also reported: `MissingIdentifier` (blank respondent or group), `DuplicateSubmission`
(several forms from the same respondent for the same group), `UndefinedGroupMean` and
`MalformedForm` for the files that could not be read at all. These files are skipped.

The multipliers are computed even when problems are reported. They should not be used
before the problems are addressed.

## The Peer Evaluation Multiplier

The score of a rating is the sum of q1 to q7. Ratings with a blank criterion have no
score and are left out of all the means: they never count as zero.

- the mean score of a member is the mean of all the scores this member received in the
  group, including their own rating of themselves, rounded to 4 decimals
- the mean score of a group is the mean of all the scores given in the group
- the PEM is the mean score of the member divided by the mean score of the group,
  rounded to 4 decimals

A PEM above 1 means that the member was rated above the average of the group.
When a group has no usable rating (or a mean of zero), the PEM of its members is
`undefined`. The same applies to a member who did not receive any complete rating.

Rounding is half away from zero.

## Outputs

All the files are written in the working directory, sorted:

- `peereval.csv`: one row per rating: `group,respondent,member,score,q1,...,q7,comments`
- `group_feedback.csv`: one row per form: `group,respondent,feedback`
- `pem.csv`: one row per member: `group,member,score,pem,q1,...,q7,feedback`
- `diagnostics.csv`: the problems found: `severity,kind,group,respondent,file,message`

By default every member is kept in `pem.csv`, with an empty feedback if they did not
hand in a form (`"joinMode": "left"`). With `"joinMode": "inner"`, these members are dropped.

## Configuration

`peereval` works without configuration for the standard template. A different
version of the template can be described in a JSON file passed with `--config`:

```json
{
  "respondentCell": "C4",
  "groupCell": "C6",
  "feedbackCell": "L11",
  "memberBlock": {
    "firstRow": 19,
    "rows": 8,
    "memberColumn": "B",
    "firstScoreColumn": "C",
    "commentColumn": "L"
  },
  "scoreRange": { "min": 1, "max": 5 },
  "minGroupSize": 2,
  "decimalPlaces": 4,
  "joinMode": "left",
  "excelWorksheetName": "Form"
}
```

All the keys are optional. Rows are numbered from 1, columns are letters or numbers
starting at 1, as in Excel.

 */
