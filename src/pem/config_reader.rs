use crate::pem::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberBlockConfig {
    #[serde(rename = "firstRow")]
    pub first_row: Option<JSValue>,
    pub rows: Option<JSValue>,
    #[serde(rename = "memberColumn")]
    pub member_column: Option<JSValue>,
    #[serde(rename = "firstScoreColumn")]
    pub first_score_column: Option<JSValue>,
    #[serde(rename = "commentColumn")]
    pub comment_column: Option<JSValue>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRangeConfig {
    pub min: f64,
    pub max: f64,
}

/// The content of the configuration file. Every field is optional.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(rename = "respondentCell")]
    pub respondent_cell: Option<String>,
    #[serde(rename = "groupCell")]
    pub group_cell: Option<String>,
    #[serde(rename = "feedbackCell")]
    pub feedback_cell: Option<String>,
    #[serde(rename = "memberBlock")]
    pub member_block: Option<MemberBlockConfig>,
    #[serde(rename = "scoreRange")]
    pub score_range: Option<ScoreRangeConfig>,
    #[serde(rename = "minGroupSize")]
    pub min_group_size: Option<usize>,
    #[serde(rename = "decimalPlaces")]
    pub decimal_places: Option<u32>,
    #[serde(rename = "joinMode")]
    pub join_mode: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

/// The validated configuration of a run.
#[derive(PartialEq, Debug, Clone)]
pub struct PemConfig {
    pub layout: FormLayout,
    pub rules: AggregationRules,
    /// The worksheet to read. The first one if not provided.
    pub worksheet: Option<String>,
}

impl Default for PemConfig {
    fn default() -> Self {
        PemConfig {
            layout: FormLayout::DEFAULT,
            rules: AggregationRules::DEFAULT_RULES,
            worksheet: None,
        }
    }
}

pub fn read_config(path: Option<&str>) -> PemResult<PemConfig> {
    match path {
        None => Ok(PemConfig::default()),
        Some(p) => {
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path: p })?;
            debug!("read content: {:?}", contents);
            parse_config(contents.as_str())
        }
    }
}

pub fn parse_config(contents: &str) -> PemResult<PemConfig> {
    let fc: FormConfig = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    validate_config(&fc)
}

fn validate_config(fc: &FormConfig) -> PemResult<PemConfig> {
    let dl = FormLayout::DEFAULT;
    let dr = AggregationRules::DEFAULT_RULES;
    let block = fc.member_block.clone().unwrap_or_default();

    let layout = FormLayout {
        respondent: read_cell_ref("respondentCell", &fc.respondent_cell)?.unwrap_or(dl.respondent),
        group: read_cell_ref("groupCell", &fc.group_cell)?.unwrap_or(dl.group),
        feedback: read_cell_ref("feedbackCell", &fc.feedback_cell)?.unwrap_or(dl.feedback),
        members: MemberBlock {
            first_row: match read_js_int("firstRow", &block.first_row)? {
                Some(x) if x >= 1 => x - 1,
                Some(x) => whatever!("firstRow starts at 1, got {}", x),
                None => dl.members.first_row,
            },
            rows: read_js_int("rows", &block.rows)?.unwrap_or(dl.members.rows),
            member_col: read_js_column("memberColumn", &block.member_column)?
                .unwrap_or(dl.members.member_col),
            first_score_col: read_js_column("firstScoreColumn", &block.first_score_column)?
                .unwrap_or(dl.members.first_score_col),
            comment_col: read_js_column("commentColumn", &block.comment_column)?
                .unwrap_or(dl.members.comment_col),
        },
    };

    let rules = AggregationRules {
        decimal_places: match fc.decimal_places {
            Some(x) if x > 15 => whatever!("decimalPlaces cannot exceed 15, got {}", x),
            Some(x) => x,
            None => dr.decimal_places,
        },
        join_mode: match fc.join_mode.as_deref() {
            None | Some("left") => JoinMode::Left,
            Some("inner") => JoinMode::Inner,
            Some(x) => whatever!(
                "Cannot use join mode {:?}: expected \"left\" or \"inner\"",
                x
            ),
        },
        score_range: match &fc.score_range {
            Some(sr) if sr.min <= sr.max => ScoreRange {
                min: sr.min,
                max: sr.max,
            },
            Some(sr) => whatever!("Invalid score range {}..{}", sr.min, sr.max),
            None => dr.score_range,
        },
        min_group_size: fc.min_group_size.unwrap_or(dr.min_group_size),
    };

    Ok(PemConfig {
        layout,
        rules,
        worksheet: fc.excel_worksheet_name.clone(),
    })
}

fn read_cell_ref(field: &str, x: &Option<String>) -> PemResult<Option<CellRef>> {
    match x {
        None => Ok(None),
        Some(s) => CellRef::from_a1(s)
            .map(Some)
            .context(InvalidCellReferenceSnafu {
                field,
                reference: s.clone(),
            }),
    }
}

fn read_js_int(field: &str, x: &Option<JSValue>) -> PemResult<Option<usize>> {
    match x {
        None => Ok(None),
        Some(JSValue::Number(n)) => match n.as_u64() {
            Some(v) => Ok(Some(v as usize)),
            None => whatever!("{}: expected a positive integer, got {}", field, n),
        },
        Some(JSValue::String(s)) => match s.trim().parse::<usize>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => whatever!("{}: expected a positive integer, got {:?}", field, s),
        },
        Some(v) => whatever!("{}: expected a positive integer, got {}", field, v),
    }
}

// Columns are given either as Excel letters or as numbers starting at 1.
fn read_js_column(field: &str, x: &Option<JSValue>) -> PemResult<Option<usize>> {
    let reference = match x {
        None => return Ok(None),
        Some(JSValue::String(s)) => s.trim().to_string(),
        Some(v) => v.to_string(),
    };
    let col = match reference.parse::<usize>() {
        Ok(idx) if idx >= 1 => Some(idx - 1),
        Ok(_) => None,
        Err(_) => column_index(&reference),
    };
    col.map(Some).context(InvalidCellReferenceSnafu { field, reference })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(parse_config("{}").unwrap(), PemConfig::default());
        assert_eq!(read_config(None).unwrap(), PemConfig::default());
    }

    #[test]
    fn full_config() {
        let config = parse_config(
            r#"{
                "respondentCell": "D5",
                "groupCell": "D7",
                "feedbackCell": "M12",
                "memberBlock": {
                    "firstRow": 20,
                    "rows": "6",
                    "memberColumn": "C",
                    "firstScoreColumn": 4,
                    "commentColumn": "M"
                },
                "scoreRange": { "min": 0, "max": 10 },
                "minGroupSize": 3,
                "decimalPlaces": 2,
                "joinMode": "inner",
                "excelWorksheetName": "Form"
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.layout,
            FormLayout {
                respondent: CellRef::new(4, 3),
                group: CellRef::new(6, 3),
                feedback: CellRef::new(11, 12),
                members: MemberBlock {
                    first_row: 19,
                    rows: 6,
                    member_col: 2,
                    first_score_col: 3,
                    comment_col: 12,
                },
            }
        );
        assert_eq!(config.rules.decimal_places, 2);
        assert_eq!(config.rules.join_mode, JoinMode::Inner);
        assert_eq!(config.rules.score_range, ScoreRange { min: 0.0, max: 10.0 });
        assert_eq!(config.rules.min_group_size, 3);
        assert_eq!(config.worksheet, Some("Form".to_string()));
    }

    #[test]
    fn partial_member_block() {
        let config = parse_config(r#"{"memberBlock": {"rows": 10}}"#).unwrap();
        let expected = MemberBlock {
            rows: 10,
            ..FormLayout::DEFAULT.members
        };
        assert_eq!(config.layout.members, expected);
    }

    #[test]
    fn invalid_configs() {
        assert!(matches!(
            parse_config(r#"{"groupCell": "6C"}"#),
            Err(PemError::InvalidCellReference { .. })
        ));
        assert!(matches!(
            parse_config(r#"{"memberBlock": {"memberColumn": 0}}"#),
            Err(PemError::InvalidCellReference { .. })
        ));
        assert!(matches!(
            parse_config(r#"{"joinMode": "outer"}"#),
            Err(PemError::Whatever { .. })
        ));
        assert!(matches!(
            parse_config(r#"{"scoreRange": {"min": 5, "max": 1}}"#),
            Err(PemError::Whatever { .. })
        ));
        assert!(matches!(
            parse_config("not json"),
            Err(PemError::ParsingJson { .. })
        ));
        assert!(matches!(
            read_config(Some("/nonexistent/peereval.json")),
            Err(PemError::OpeningJson { .. })
        ));
    }
}
