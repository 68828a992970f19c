#[cfg(test)]
mod tests {
    use crate::models::{
        CommentKey, Constraint, FlipPolicy, LedgerEntry, ObsId, VisibilityKind,
    };
    use crate::parsing::comment_parser::{
        is_comment_end, parse_approval_row, parse_blackout_row, parse_comment_header,
        parse_general, parse_remark,
    };

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_comment_headers() {
        assert_eq!(
            parse_comment_header("COMMENT ID=GENERAL"),
            Some(Ok(CommentKey::General))
        );
        assert_eq!(
            parse_comment_header("comment id=15578"),
            Some(Ok(CommentKey::Obsid(ObsId(15578))))
        );
        assert!(matches!(parse_comment_header("COMMENT ID=FOO"), Some(Err(_))));
        assert_eq!(parse_comment_header("COMMENTARY on the week"), None);
        assert_eq!(parse_comment_header("ID=100,TARGET=(1,2,{x})"), None);
        assert!(is_comment_end("  end comment "));
    }

    #[test]
    fn test_general_tables() {
        let text = lines(
            "Week of 2013 NOV 06.\n\
             Priority legend: 1 = highest.\n\
             LOW VISIBILITY\n\
             OBSID START END KIND\n\
             13458 312 314 MOON\n\
             15578 300.5 301 SUN\n\
             END LOW VISIBILITY\n\
             APPROVAL\n\
             13458 APPROVED\n\
             15578 NOT_APPROVED SPLIT 13458\n\
             16000 NOT_APPROVED\n\
             END APPROVAL\n\
             Pitch/time summary follows.",
        );
        let tables = parse_general(&text);
        assert!(tables.warnings.is_empty(), "{:?}", tables.warnings);
        assert_eq!(tables.blackouts.len(), 2);
        assert_eq!(tables.blackouts[0].obsid, ObsId(13458));
        assert_eq!(tables.blackouts[0].kind, VisibilityKind::Moon);
        assert_eq!(tables.blackouts[1].window.start.value(), 300.5);

        assert_eq!(tables.ledger.get(ObsId(13458)), Some(&LedgerEntry::Approved));
        assert_eq!(
            tables.ledger.get(ObsId(15578)),
            Some(&LedgerEntry::NotApproved {
                split_of: Some(ObsId(13458))
            })
        );
        assert_eq!(
            tables.ledger.get(ObsId(16000)),
            Some(&LedgerEntry::NotApproved { split_of: None })
        );
    }

    #[test]
    fn test_bad_table_rows_become_warnings() {
        let text = lines("LOW VISIBILITY\n13458 314 312 MOON\n13459 1 2 COMET\nEND LOW VISIBILITY\nAPPROVAL\n1 MAYBE");
        let tables = parse_general(&text);
        assert!(tables.blackouts.is_empty());
        assert_eq!(tables.warnings.len(), 4);
        assert!(tables.warnings[3].contains("not terminated"));
    }

    #[test]
    fn test_blackout_row() {
        let row = parse_blackout_row("13458 312 314 sun").unwrap();
        assert_eq!(row.kind, VisibilityKind::Sun);
        assert_eq!(row.window.start.value(), 312.0);
        assert_eq!(row.window.end.value(), 314.0);
        assert!(parse_blackout_row("13458 312 MOON").is_err());
    }

    #[test]
    fn test_approval_row_variants() {
        assert_eq!(
            parse_approval_row("15578 not approved split 13458").unwrap(),
            (
                ObsId(15578),
                LedgerEntry::NotApproved {
                    split_of: Some(ObsId(13458))
                }
            )
        );
        assert!(parse_approval_row("15578 NOT_APPROVED SPLIT abc").is_err());
        assert!(parse_approval_row("x APPROVED").is_err());
    }

    #[test]
    fn test_remark_directives() {
        let text = lines(
            "Observer requests a quiet background.\n\
             ROLL PREFERENCE: 36.0 +/- 5.0, +180 NOT OK\n\
             MONITOR: 13458 DAYS 3-5\n\
             STABILITY REQUIRED: gyro bias calibration",
        );
        let directives = parse_remark(&text);
        assert!(directives.warnings.is_empty(), "{:?}", directives.warnings);
        assert_eq!(directives.constraints.len(), 3);

        match &directives.constraints[0] {
            Constraint::RollPreference(window) => {
                assert_eq!(window.center.value(), 36.0);
                assert_eq!(window.tolerance.value(), 5.0);
                assert_eq!(window.flip, FlipPolicy::Forbidden);
            }
            other => panic!("expected roll preference, got {:?}", other),
        }
        match &directives.constraints[1] {
            Constraint::MonitoringOffset { reference, offset } => {
                assert_eq!(*reference, ObsId(13458));
                assert_eq!(offset.min_days, 3.0);
                assert_eq!(offset.max_days, 5.0);
            }
            other => panic!("expected monitoring offset, got {:?}", other),
        }
        assert_eq!(
            directives.constraints[2],
            Constraint::Stability {
                note: Some("gyro bias calibration".to_string())
            }
        );
    }

    #[test]
    fn test_roll_preference_flip_ok() {
        let directives = parse_remark(&lines("Roll preference = 120 +/- 15, +180 ok"));
        match &directives.constraints[0] {
            Constraint::RollPreference(window) => assert_eq!(window.flip, FlipPolicy::Allowed),
            other => panic!("expected roll preference, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_directives_warn() {
        let directives = parse_remark(&lines(
            "ROLL PREFERENCE: around 36\nMONITOR: 13458 DAYS 5-3\nROLL PREFERENCE: 36 +/- 5, maybe",
        ));
        assert!(directives.constraints.is_empty());
        assert_eq!(directives.warnings.len(), 3);
    }
}
