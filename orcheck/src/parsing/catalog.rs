//! Catalog loader: turns OR list text into a [`Catalog`].
//!
//! The loader splits the text into observation records and comment blocks,
//! parses each, then attaches comment-derived constraints and ledger status to
//! the observations they name.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CheckError, CheckResult, StructuralError};
use crate::models::{
    ApprovalLedger, Catalog, CommentBlock, CommentKey, Constraint, FlipPolicy, ObsId, Observation,
    RollSpec, RollWindow,
};
use crate::parsing::comment_parser::{
    is_comment_end, parse_comment_header, parse_general, parse_remark,
};
use crate::parsing::record_parser::{parse_record, RawRecord};

/// Records and comment blocks found in the source text, before interpretation.
#[derive(Debug, Default)]
struct SourceLayout {
    records: Vec<RawRecord>,
    comments: Vec<CommentBlock>,
    notices: Vec<String>,
}

fn is_record_start(line: &str) -> bool {
    line.trim_start().to_ascii_uppercase().starts_with("ID=")
}

fn split_source(text: &str) -> Result<SourceLayout, StructuralError> {
    let mut layout = SourceLayout::default();
    let mut open_comment: Option<(Result<CommentKey, String>, usize, Vec<String>)> = None;
    let mut open_record: Option<RawRecord> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if let Some((key, start, mut lines)) = open_comment.take() {
            if is_comment_end(line) {
                layout.comments.push(match key {
                    Ok(CommentKey::General) => CommentBlock::General { lines },
                    Ok(CommentKey::Obsid(obsid)) => CommentBlock::Remark { obsid, lines },
                    Err(reason) => {
                        layout
                            .notices
                            .push(format!("line {}: {}; block kept as general text", start, reason));
                        CommentBlock::General { lines }
                    }
                });
            } else {
                lines.push(line.to_string());
                open_comment = Some((key, start, lines));
            }
            continue;
        }

        if let Some(mut record) = open_record.take() {
            let trimmed = line.trim();
            if is_record_start(trimmed) || parse_comment_header(trimmed).is_some() {
                layout.notices.push(format!(
                    "line {}: record ends with a trailing comma",
                    record.line
                ));
                layout.records.push(record);
            } else {
                record.text.push_str(trimmed);
                if trimmed.ends_with(',') {
                    open_record = Some(record);
                } else {
                    layout.records.push(record);
                }
                continue;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('!') {
            continue;
        }

        if let Some(key) = parse_comment_header(trimmed) {
            open_comment = Some((key, line_no, Vec::new()));
        } else if is_record_start(trimmed) {
            let record = RawRecord {
                line: line_no,
                text: trimmed.to_string(),
            };
            if trimmed.ends_with(',') {
                open_record = Some(record);
            } else {
                layout.records.push(record);
            }
        } else {
            layout
                .notices
                .push(format!("line {}: unrecognized text ignored", line_no));
        }
    }

    if let Some((key, start, _)) = open_comment {
        return Err(StructuralError::UnterminatedComment {
            key: match key {
                Ok(key) => key.to_string(),
                Err(_) => "unknown id".to_string(),
            },
            line: start,
        });
    }
    if let Some(record) = open_record {
        layout.records.push(record);
    }

    Ok(layout)
}

/// Loader for weekly OR list text.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load an OR list file.
    pub fn load_file(path: &Path) -> CheckResult<Catalog> {
        let text = std::fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_str(&text)
    }

    /// Load OR list text.
    ///
    /// # Errors
    ///
    /// Fails with a [`StructuralError`] when a record lacks a usable `ID` or
    /// `TARGET`, an obsid is declared twice, or a comment block is never
    /// closed. Everything else is reported as warnings in the catalog.
    pub fn load_str(text: &str) -> CheckResult<Catalog> {
        let layout = split_source(text)?;

        let mut observations: BTreeMap<ObsId, Observation> = BTreeMap::new();
        for raw in &layout.records {
            let obs = parse_record(raw)?;
            log::debug!("parsed obsid {} from line {}", obs.obsid, raw.line);
            if let Some(existing) = observations.get(&obs.obsid) {
                return Err(StructuralError::DuplicateObsid {
                    obsid: obs.obsid,
                    first_line: existing.line,
                    second_line: obs.line,
                }
                .into());
            }
            observations.insert(obs.obsid, obs);
        }

        let mut catalog = Catalog {
            observations,
            comments: layout.comments,
            ledger: ApprovalLedger::new(),
            notices: layout.notices,
        };

        attach_comments(&mut catalog);
        attach_ledger(&mut catalog);

        for notice in &catalog.notices {
            log::warn!("{}", notice);
        }
        log::info!(
            "loaded {} observations and {} comment blocks",
            catalog.observations.len(),
            catalog.comments.len()
        );

        Ok(catalog)
    }
}

fn attach_comments(catalog: &mut Catalog) {
    let blocks = catalog.comments.clone();

    for block in &blocks {
        match block {
            CommentBlock::General { lines } => {
                let tables = parse_general(lines);
                catalog.notices.extend(tables.warnings);

                for row in tables.blackouts {
                    match catalog.observations.get_mut(&row.obsid) {
                        Some(obs) => obs.constraints.push(Constraint::Blackout {
                            window: row.window,
                            kind: row.kind,
                        }),
                        None => catalog.notices.push(format!(
                            "low-visibility row for obsid {} which is not in this list",
                            row.obsid
                        )),
                    }
                }

                for (obsid, entry) in tables.ledger.entries {
                    if catalog.ledger.insert(obsid, entry).is_some() {
                        catalog.notices.push(format!(
                            "obsid {} appears in more than one approval table; last row wins",
                            obsid
                        ));
                    }
                }
            }
            CommentBlock::Remark { obsid, lines } => {
                let directives = parse_remark(lines);
                let Some(obs) = catalog.observations.get_mut(obsid) else {
                    catalog.notices.push(format!(
                        "comment for obsid {} which is not in this list",
                        obsid
                    ));
                    continue;
                };
                obs.warnings.extend(directives.warnings);
                for constraint in directives.constraints {
                    if let Constraint::RollPreference(window) = &constraint {
                        merge_roll_preference(obs, *window);
                    }
                    obs.constraints.push(constraint);
                }
            }
        }
    }
}

/// Reconcile a comment-stated roll preference with the record's ROLL field.
fn merge_roll_preference(obs: &mut Observation, stated: RollWindow) {
    match obs.roll {
        None => obs.roll = Some(RollSpec::Preference(stated)),
        Some(RollSpec::Preference(mut window)) => {
            let same_window = (window.center.value() - stated.center.value()).abs() < 1e-6
                && (window.tolerance.value() - stated.tolerance.value()).abs() < 1e-6;
            if !same_window {
                obs.warnings.push(format!(
                    "comment roll preference {}+/-{} differs from ROLL field {}+/-{}; ROLL field kept",
                    stated.center.value(),
                    stated.tolerance.value(),
                    window.center.value(),
                    window.tolerance.value()
                ));
            }
            if window.flip == FlipPolicy::Unspecified {
                window.flip = stated.flip;
                obs.roll = Some(RollSpec::Preference(window));
            }
        }
        Some(RollSpec::Fixed(roll)) => obs.warnings.push(format!(
            "comment states a roll preference but ROLL commands fixed roll {}",
            roll.value()
        )),
    }
}

fn attach_ledger(catalog: &mut Catalog) {
    for (obsid, obs) in catalog.observations.iter_mut() {
        if let Some(entry) = catalog.ledger.get(*obsid) {
            obs.approval = entry.status();
        }
    }
}
