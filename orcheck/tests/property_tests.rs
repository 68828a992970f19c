//! Property checks over zones, chains and time budgets.

use std::collections::BTreeSet;

use proptest::prelude::*;
use proptest::test_runner::Config;

use orcheck::models::ObsId;
use orcheck::parsing::CatalogLoader;
use orcheck::services::aggregation::{BudgetEntry, TimeBudget};
use orcheck::services::chains::ChainBuilder;
use orcheck::services::zones::PitchZone;

fn zone_strategy() -> impl Strategy<Value = PitchZone> {
    prop::sample::select(PitchZone::ALL.to_vec())
}

/// Records 1000..1000+n; record `i` points at an earlier record or at nothing.
fn acyclic_list(links: &[Option<usize>]) -> String {
    links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let preceding = match link {
                Some(target) if *target < i => format!(",PRECEDING=({})", 1000 + target),
                _ => String::new(),
            };
            format!(
                "ID={},TARGET=(10.0,10.0,{{T{}}}),DURATION=(1000),PRIORITY=5{}\n",
                1000 + i,
                i,
                preceding
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn zone_bands_partition_pitch_range(pitch in 0.0f64..=180.0) {
        let zone = PitchZone::classify(pitch);
        let expected = if pitch < 46.0 || pitch >= 170.0 {
            PitchZone::Forbidden
        } else if pitch < 56.0 {
            PitchZone::Psmc
        } else if pitch < 70.0 {
            PitchZone::GoodLow
        } else if pitch < 127.0 {
            PitchZone::Bad
        } else if pitch < 145.0 {
            PitchZone::GoodHigh
        } else if pitch < 156.0 {
            PitchZone::Cold
        } else {
            PitchZone::PLine
        };
        prop_assert_eq!(zone, expected);
    }

    #[test]
    fn zone_names_parse_back(zone in zone_strategy()) {
        prop_assert_eq!(zone.as_str().parse::<PitchZone>().unwrap(), zone);
    }

    #[test]
    fn budget_groupings_agree(
        entries in prop::collection::vec((0i32..10, zone_strategy(), 0.0f64..100_000.0), 0..40)
    ) {
        let entries: Vec<BudgetEntry> = entries
            .into_iter()
            .enumerate()
            .map(|(i, (priority, zone, seconds))| BudgetEntry {
                obsid: ObsId(i as u32),
                priority,
                zone,
                seconds,
            })
            .collect();
        let count = entries.len();
        let budget = TimeBudget::from_entries(entries, Vec::new());

        let by_zone: f64 = budget.by_zone.values().map(|s| s.seconds).sum();
        let by_priority: f64 = budget.by_priority.values().map(|s| s.seconds).sum();
        let tolerance = 1e-6 * budget.total_seconds.max(1.0);
        prop_assert!((by_zone - budget.total_seconds).abs() < tolerance);
        prop_assert!((by_priority - budget.total_seconds).abs() < tolerance);

        prop_assert_eq!(budget.included, count);
        prop_assert_eq!(budget.by_zone.values().map(|s| s.observations).sum::<usize>(), count);
        prop_assert_eq!(budget.by_priority.values().map(|s| s.observations).sum::<usize>(), count);

        if budget.total_seconds > 0.0 {
            let zone_pct: f64 = budget.by_zone.values().map(|s| s.percent).sum();
            let tier_pct: f64 = budget.by_priority.values().map(|s| s.percent).sum();
            prop_assert!((zone_pct - 100.0).abs() < 0.01);
            prop_assert!((tier_pct - 100.0).abs() < 0.01);
        }
    }

    #[test]
    fn every_observation_lands_in_one_chain(
        links in prop::collection::vec(prop::option::of(0usize..30), 1..30)
    ) {
        let catalog = CatalogLoader::load_str(&acyclic_list(&links)).unwrap();
        let set = ChainBuilder::new().build(&catalog).unwrap();

        let mut seen = BTreeSet::new();
        for chain in &set.chains {
            prop_assert!(!chain.members.is_empty());
            for obsid in &chain.members {
                prop_assert!(seen.insert(*obsid), "{} appears twice", obsid);
            }
        }
        let all: BTreeSet<ObsId> = catalog.observations.keys().copied().collect();
        prop_assert_eq!(seen, all);

        for (obsid, position) in &set.positions {
            let chain = &set.chains[position.chain];
            prop_assert_eq!(chain.members[position.position], *obsid);
            prop_assert_eq!(position.length, chain.members.len());
        }
    }
}
