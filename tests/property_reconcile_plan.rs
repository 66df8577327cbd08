use atc::domain::models::{Cuid, Plane, PlaneStatus};
use atc::services::{plan_reconciliation, ReconcilePlan};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

/// Planes with distinct CUIDs, small creation-time spread (to force ties)
/// and a mix of statuses.
fn planes_strategy(max: usize) -> impl Strategy<Value = Vec<Plane>> {
    prop::collection::vec((0i64..5, any::<bool>(), any::<bool>()), 0..max).prop_map(|specs| {
        let formation_id = Uuid::nil();
        let epoch = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (age, destroying, lxc))| {
                let prefix = if lxc { "proxmox.lxc" } else { "dummy" };
                let mut plane = Plane::built(Cuid::new(prefix, format!("{i:03}")), formation_id);
                plane.created_at = epoch + Duration::seconds(age);
                plane.updated_at = plane.created_at;
                if destroying {
                    plane.status = PlaneStatus::Destroying;
                }
                plane
            })
            .collect()
    })
}

proptest! {
    /// Property: the plan closes exactly the gap between live and target.
    #[test]
    fn prop_plan_closes_gap(planes in planes_strategy(24), target in 0u32..30) {
        let live = planes.len();
        let target_usize = target as usize;

        match plan_reconciliation(target, &planes) {
            ReconcilePlan::Noop => prop_assert_eq!(live, target_usize),
            ReconcilePlan::ScaleUp { count } => {
                prop_assert!(live < target_usize);
                prop_assert_eq!(live + count, target_usize);
            }
            ReconcilePlan::ScaleDown { victims } => {
                prop_assert!(live > target_usize);
                prop_assert_eq!(live - victims.len(), target_usize);
            }
        }
    }

    /// Property: victims are distinct records of this formation.
    #[test]
    fn prop_victims_distinct_and_known(planes in planes_strategy(24), target in 0u32..24) {
        if let ReconcilePlan::ScaleDown { victims } = plan_reconciliation(target, &planes) {
            let known: HashSet<&Cuid> = planes.iter().map(|p| &p.cuid).collect();
            let unique: HashSet<&Cuid> = victims.iter().collect();
            prop_assert_eq!(unique.len(), victims.len());
            prop_assert!(victims.iter().all(|v| known.contains(v)));
        }
    }

    /// Property: planes already being destroyed are chosen before any
    /// running plane, and running victims are never newer than survivors.
    #[test]
    fn prop_victim_order(planes in planes_strategy(24), target in 0u32..24) {
        if let ReconcilePlan::ScaleDown { victims } = plan_reconciliation(target, &planes) {
            let chosen: HashSet<&Cuid> = victims.iter().collect();
            let survivors: Vec<&Plane> = planes.iter().filter(|p| !chosen.contains(&p.cuid)).collect();
            let victims: Vec<&Plane> = planes.iter().filter(|p| chosen.contains(&p.cuid)).collect();

            if survivors.iter().any(|p| p.status == PlaneStatus::Destroying) {
                prop_assert!(victims.iter().all(|p| p.status == PlaneStatus::Destroying));
            }

            for victim in victims.iter().filter(|p| p.status == PlaneStatus::Running) {
                for survivor in &survivors {
                    prop_assert!(survivor.status == PlaneStatus::Running);
                    prop_assert!(victim.created_at <= survivor.created_at);
                }
            }
        }
    }

    /// Property: the plan does not depend on the order records were listed in.
    #[test]
    fn prop_plan_ignores_input_order(
        planes in planes_strategy(16),
        target in 0u32..16,
        seed in any::<u64>(),
    ) {
        let mut shuffled = planes.clone();
        let len = shuffled.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let j = usize::try_from(state >> 33).unwrap() % (i + 1);
                shuffled.swap(i, j);
            }
        }

        let sorted_victims = |plan: ReconcilePlan| match plan {
            ReconcilePlan::ScaleDown { victims } => victims,
            _ => Vec::new(),
        };

        prop_assert_eq!(
            sorted_victims(plan_reconciliation(target, &planes)),
            sorted_victims(plan_reconciliation(target, &shuffled))
        );
    }

    /// Property: a CUID built from a prefix and any local id splits back into
    /// the same prefix and local id.
    #[test]
    fn prop_cuid_prefix_round_trip(
        prefix in "[a-z][a-z.]{0,11}",
        local in "[A-Za-z0-9:_-]{1,20}",
    ) {
        let cuid = Cuid::new(&prefix, &local);
        prop_assert_eq!(cuid.prefix().unwrap(), prefix.as_str());
        prop_assert_eq!(cuid.local_id().unwrap(), local.as_str());
    }
}
