// Primitives for writing the CSV outputs.

use csv::{Terminator, Writer, WriterBuilder};

use crate::pem::*;

fn criteria_header() -> Vec<String> {
    (1..=NUM_CRITERIA).map(|i| format!("q{}", i)).collect()
}

fn opt_str(x: &Option<String>) -> String {
    x.clone().unwrap_or_default()
}

fn opt_num(x: &Option<f64>) -> String {
    x.map(|v| v.to_string()).unwrap_or_default()
}

fn write_table<F>(name: &str, header: Vec<String>, mut write_rows: F) -> PemResult<String>
where
    F: FnMut(&mut Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(&header)
        .context(WritingCsvSnafu { path: name })?;
    write_rows(&mut wtr).context(WritingCsvSnafu { path: name })?;
    let bytes = match wtr.into_inner() {
        Ok(b) => b,
        Err(e) => whatever!("Error flushing {}: {}", name, e.error()),
    };
    String::from_utf8(bytes).whatever_context(format!("Invalid UTF-8 in {}", name))
}

/// One line per rating: `group,respondent,member,score,q1..q7,comments`.
pub fn ratings_to_csv(ratings: &[MemberRating]) -> PemResult<String> {
    let mut header = vec![
        "group".to_string(),
        "respondent".to_string(),
        "member".to_string(),
        "score".to_string(),
    ];
    header.extend(criteria_header());
    header.push("comments".to_string());
    write_table(RATINGS_FILE, header, |wtr| {
        for r in ratings.iter() {
            let mut line = vec![
                opt_str(&r.group),
                opt_str(&r.respondent),
                opt_str(&r.member),
                opt_num(&r.score()),
            ];
            line.extend(r.criteria.iter().map(opt_num));
            line.push(opt_str(&r.comment));
            wtr.write_record(&line)?;
        }
        Ok(())
    })
}

pub fn feedback_to_csv(feedback: &[GroupFeedback]) -> PemResult<String> {
    let header = vec![
        "group".to_string(),
        "respondent".to_string(),
        "feedback".to_string(),
    ];
    write_table(FEEDBACK_FILE, header, |wtr| {
        for f in feedback.iter() {
            wtr.write_record(&[
                opt_str(&f.group),
                opt_str(&f.respondent),
                opt_str(&f.feedback),
            ])?;
        }
        Ok(())
    })
}

/// One line per member: `group,member,score,pem,q1..q7,feedback`.
pub fn summary_to_csv(summaries: &[MemberSummary]) -> PemResult<String> {
    let mut header = vec![
        "group".to_string(),
        "member".to_string(),
        "score".to_string(),
        "pem".to_string(),
    ];
    header.extend(criteria_header());
    header.push("feedback".to_string());
    write_table(SUMMARY_FILE, header, |wtr| {
        for s in summaries.iter() {
            let mut line = vec![
                opt_str(&s.group),
                opt_str(&s.member),
                opt_num(&s.mean_score),
                s.pem.to_string(),
            ];
            line.extend(s.criteria_means.iter().map(opt_num));
            line.push(opt_str(&s.feedback));
            wtr.write_record(&line)?;
        }
        Ok(())
    })
}

pub fn diagnostics_to_csv(diagnostics: &[Diagnostic]) -> PemResult<String> {
    let header = vec![
        "severity".to_string(),
        "kind".to_string(),
        "group".to_string(),
        "respondent".to_string(),
        "file".to_string(),
        "message".to_string(),
    ];
    write_table(DIAGNOSTICS_FILE, header, |wtr| {
        for d in diagnostics.iter() {
            wtr.write_record(&[
                d.severity.as_str().to_string(),
                d.kind.as_str().to_string(),
                opt_str(&d.group),
                opt_str(&d.respondent),
                opt_str(&d.file),
                d.message.clone(),
            ])?;
        }
        Ok(())
    })
}
