//! Parsers for comment blocks and the structured tables inside them.
//!
//! Comment text is mostly free narrative and is passed through untouched. The
//! general block may carry a `LOW VISIBILITY` table and an `APPROVAL` table;
//! observation remarks may restate a roll preference or declare monitoring
//! and stability requirements.

use qtty::Degrees;

use crate::models::{
    ApprovalLedger, CommentKey, Constraint, DayOfYear, DayRange, FlipPolicy, LedgerEntry, ObsId,
    OffsetRange, RollWindow, VisibilityKind,
};

const GENERAL_SENTINEL: &str = "GENERAL";
const LOW_VISIBILITY_START: &str = "LOW VISIBILITY";
const LOW_VISIBILITY_END: &str = "END LOW VISIBILITY";
const APPROVAL_START: &str = "APPROVAL";
const APPROVAL_END: &str = "END APPROVAL";

/// Key from a `COMMENT ID=<obsid|GENERAL>` header, `None` if `line` is not a
/// comment header.
///
/// Returns `Some(Err(..))` for a header whose id is neither an obsid nor the
/// general sentinel.
pub fn parse_comment_header(line: &str) -> Option<Result<CommentKey, String>> {
    let trimmed = line.trim();
    let upper = trimmed.to_ascii_uppercase();
    let rest = upper.strip_prefix("COMMENT")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) && !rest.starts_with(',') {
        return None;
    }
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    let id = match rest.strip_prefix("ID=") {
        Some(id) => id.trim(),
        None => return Some(Err(format!("comment header '{}' has no ID=", trimmed))),
    };

    if id == GENERAL_SENTINEL {
        return Some(Ok(CommentKey::General));
    }
    Some(
        id.parse::<ObsId>()
            .map(CommentKey::Obsid)
            .map_err(|_| format!("comment id '{}' is neither an obsid nor GENERAL", id)),
    )
}

/// True for the line closing a comment block.
pub fn is_comment_end(line: &str) -> bool {
    let upper = line.trim().to_ascii_uppercase();
    upper == "END COMMENT" || upper == "ENDCOMMENT"
}

/// One row of the low-visibility table.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackoutRow {
    pub obsid: ObsId,
    pub window: DayRange,
    pub kind: VisibilityKind,
}

/// Structured content of the general comment block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralTables {
    pub blackouts: Vec<BlackoutRow>,
    pub ledger: ApprovalLedger,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Narrative,
    LowVisibility,
    Approval,
}

/// Extract the low-visibility and approval tables from general comment text.
pub fn parse_general(lines: &[String]) -> GeneralTables {
    let mut tables = GeneralTables::default();
    let mut section = Section::Narrative;

    for line in lines {
        let trimmed = line.trim();
        let upper = trimmed.to_ascii_uppercase();

        match section {
            Section::Narrative => {
                if upper == LOW_VISIBILITY_START {
                    section = Section::LowVisibility;
                } else if upper == APPROVAL_START {
                    section = Section::Approval;
                }
            }
            Section::LowVisibility => {
                if upper == LOW_VISIBILITY_END {
                    section = Section::Narrative;
                } else if !trimmed.is_empty() && !is_table_header(&upper) {
                    match parse_blackout_row(trimmed) {
                        Ok(row) => tables.blackouts.push(row),
                        Err(reason) => tables
                            .warnings
                            .push(format!("low-visibility row '{}': {}", trimmed, reason)),
                    }
                }
            }
            Section::Approval => {
                if upper == APPROVAL_END {
                    section = Section::Narrative;
                } else if !trimmed.is_empty() && !is_table_header(&upper) {
                    match parse_approval_row(trimmed) {
                        Ok((obsid, entry)) => {
                            if tables.ledger.insert(obsid, entry).is_some() {
                                tables.warnings.push(format!(
                                    "approval ledger lists obsid {} more than once; last row wins",
                                    obsid
                                ));
                            }
                        }
                        Err(reason) => tables
                            .warnings
                            .push(format!("approval row '{}': {}", trimmed, reason)),
                    }
                }
            }
        }
    }

    match section {
        Section::LowVisibility => tables
            .warnings
            .push("LOW VISIBILITY table is not terminated".to_string()),
        Section::Approval => tables
            .warnings
            .push("APPROVAL table is not terminated".to_string()),
        Section::Narrative => {}
    }

    tables
}

fn is_table_header(upper: &str) -> bool {
    upper.starts_with("OBSID")
}

/// `<obsid> <start_day> <end_day> <SUN|MOON>`
pub fn parse_blackout_row(row: &str) -> Result<BlackoutRow, String> {
    let cols: Vec<&str> = row.split_whitespace().collect();
    if cols.len() != 4 {
        return Err(format!("expected 4 columns, found {}", cols.len()));
    }
    let obsid = cols[0]
        .parse::<ObsId>()
        .map_err(|_| format!("'{}' is not an obsid", cols[0]))?;
    let start = cols[1]
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a day-of-year", cols[1]))?;
    let end = cols[2]
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a day-of-year", cols[2]))?;
    let window = DayRange::new(DayOfYear::new(start), DayOfYear::new(end))
        .ok_or_else(|| format!("window ends ({}) before it starts ({})", end, start))?;
    let kind = cols[3].parse::<VisibilityKind>()?;
    Ok(BlackoutRow {
        obsid,
        window,
        kind,
    })
}

/// `<obsid> APPROVED` or `<obsid> NOT_APPROVED [SPLIT <parent>]`
pub fn parse_approval_row(row: &str) -> Result<(ObsId, LedgerEntry), String> {
    let cols: Vec<String> = row
        .split_whitespace()
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let obsid = cols
        .first()
        .ok_or_else(|| "empty row".to_string())?
        .parse::<ObsId>()
        .map_err(|_| format!("'{}' is not an obsid", cols[0]))?;

    let rest: Vec<&str> = cols[1..].iter().map(String::as_str).collect();
    let entry = match rest.as_slice() {
        ["APPROVED"] => LedgerEntry::Approved,
        ["NOT_APPROVED"] | ["NOT", "APPROVED"] => LedgerEntry::NotApproved { split_of: None },
        ["NOT_APPROVED", "SPLIT", parent] | ["NOT", "APPROVED", "SPLIT", parent] => {
            let parent = parent
                .parse::<ObsId>()
                .map_err(|_| format!("split parent '{}' is not an obsid", parent))?;
            LedgerEntry::NotApproved {
                split_of: Some(parent),
            }
        }
        _ => return Err("expected APPROVED or NOT_APPROVED [SPLIT <obsid>]".to_string()),
    };
    Ok((obsid, entry))
}

/// Structured content of one observation remark.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemarkDirectives {
    pub constraints: Vec<Constraint>,
    pub warnings: Vec<String>,
}

/// Extract constraints from observation remark text.
pub fn parse_remark(lines: &[String]) -> RemarkDirectives {
    let mut directives = RemarkDirectives::default();

    for line in lines {
        let trimmed = line.trim();
        let upper = trimmed.to_ascii_uppercase();

        if let Some(rest) = upper.strip_prefix("ROLL PREFERENCE") {
            match parse_roll_preference(rest) {
                Ok(window) => directives.constraints.push(Constraint::RollPreference(window)),
                Err(reason) => directives
                    .warnings
                    .push(format!("roll preference '{}': {}", trimmed, reason)),
            }
        } else if let Some(rest) = upper.strip_prefix("MONITOR") {
            match parse_monitor(rest) {
                Ok(constraint) => directives.constraints.push(constraint),
                Err(reason) => directives
                    .warnings
                    .push(format!("monitoring line '{}': {}", trimmed, reason)),
            }
        } else if upper.starts_with("STABILITY REQUIRED") {
            let note = trimmed
                .split_once(':')
                .map(|(_, note)| note.trim().to_string())
                .filter(|note| !note.is_empty());
            directives.constraints.push(Constraint::Stability { note });
        }
    }

    directives
}

/// `: <center> +/- <tol> [, +180 OK | , +180 NOT OK]` (already upper-cased)
fn parse_roll_preference(rest: &str) -> Result<RollWindow, String> {
    let rest = rest.trim_start().trim_start_matches(|c| c == ':' || c == '=').trim();
    let mut parts = rest.splitn(2, ',');
    let window_text = parts.next().unwrap_or("").trim();
    let flag_text = parts.next().map(str::trim).unwrap_or("");

    let (center, tolerance) = window_text
        .split_once("+/-")
        .or_else(|| window_text.split_once('±'))
        .ok_or_else(|| "expected '<center> +/- <tolerance>'".to_string())?;
    let center = center
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not an angle", center.trim()))?;
    let tolerance = tolerance
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not an angle", tolerance.trim()))?;
    if tolerance < 0.0 {
        return Err(format!("negative tolerance {}", tolerance));
    }

    let compact: String = flag_text.chars().filter(|c| !c.is_whitespace()).collect();
    let flip = match compact.as_str() {
        "" => FlipPolicy::Unspecified,
        "+180OK" => FlipPolicy::Allowed,
        "+180NOTOK" => FlipPolicy::Forbidden,
        _ => return Err(format!("unrecognized flip flag '{}'", flag_text)),
    };

    Ok(RollWindow::new(Degrees::new(center), Degrees::new(tolerance)).with_flip(flip))
}

/// `: <ref_obsid> DAYS <min>-<max>` (already upper-cased)
fn parse_monitor(rest: &str) -> Result<Constraint, String> {
    let rest = rest.trim_start().trim_start_matches(|c| c == ':' || c == '=').trim();
    let (reference, days) = rest
        .split_once("DAYS")
        .ok_or_else(|| "expected '<obsid> DAYS <min>-<max>'".to_string())?;
    let reference = reference
        .trim()
        .parse::<ObsId>()
        .map_err(|_| format!("'{}' is not an obsid", reference.trim()))?;
    let (min, max) = days
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("'{}' is not a day range", days.trim()))?;
    let min_days = min
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number of days", min.trim()))?;
    let max_days = max
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{}' is not a number of days", max.trim()))?;
    if max_days < min_days {
        return Err(format!("range {}-{} is reversed", min_days, max_days));
    }
    Ok(Constraint::MonitoringOffset {
        reference,
        offset: OffsetRange { min_days, max_days },
    })
}
