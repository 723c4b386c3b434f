//! Balance simulator: greedy play through full Time Fracture cycles.
//! Run with: cargo test simulate_prestige -- --nocapture

#[cfg(test)]
mod tests {
    use crate::collab::{CurrencyStore, HelperRegistry, SkillRegistry, UnitRegistry};
    use crate::config::EconomyConfig;
    use crate::modifiers::{aggregate, Stat, StatModifier};
    use crate::session::Session;
    use crate::state::{CurrencyKind, ProductionUnit};
    use crate::time::MAX_LIVE_DELTA_SECONDS;

    const MAX_TIER: u8 = 10;

    fn average_yield(s: &Session) -> f64 {
        let units = s.roster().units();
        units.iter().map(|u| u.base_yield).sum::<f64>() / units.len().max(1) as f64
    }

    /// Highest affordable tier whose die lifts the average yield.
    fn best_unit(s: &Session) -> Option<u8> {
        let money = s.wallet().amount(CurrencyKind::Money);
        let avg = average_yield(s);
        (1..=MAX_TIER)
            .rev()
            .find(|t| ProductionUnit::tier_base_yield(*t) > avg && s.unit_cost(*t) <= money)
    }

    fn spend(s: &mut Session) -> u32 {
        let mut purchases = 0;
        let skill_ids: Vec<String> = s.skills().definitions().map(|d| d.id.clone()).collect();
        for id in skill_ids {
            if s.unlock_skill(&id).is_ok() {
                purchases += 1;
            }
        }
        while s.hire_helper().is_ok() {
            purchases += 1;
        }
        for _ in 0..20 {
            match best_unit(s) {
                Some(tier) if s.buy_unit(tier).is_ok() => purchases += 1,
                _ => break,
            }
        }
        purchases
    }

    /// Every cached stat must equal a replay of the active modifier set.
    fn assert_stats_consistent(s: &Session) {
        let active = s.modifiers().modifiers();
        for stat in Stat::all() {
            let for_stat: Vec<&StatModifier> = active.iter().filter(|m| m.stat == *stat).collect();
            assert_eq!(s.stat(*stat), aggregate(*stat, for_stat));
        }
    }

    fn report(s: &Session, seconds: u64, purchases: u32) {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        eprintln!("┌─── {hours}h{minutes:02}m ─────────────────────────");
        eprintln!(
            "│ Money: {:.0}  Dark matter: {:.1}  Shards: {:.0}",
            s.wallet().amount(CurrencyKind::Money),
            s.wallet().amount(CurrencyKind::DarkMatter),
            s.wallet().amount(CurrencyKind::TimeShards)
        );
        eprintln!(
            "│ Level: {}  Dice: {}  Helpers: {}  Skills: {}  Purchases: {}",
            s.prestige().level(),
            s.roster().units().len(),
            s.helpers().count(),
            s.skills().unlocked().len(),
            purchases
        );
        let req = s.prestige_requirements();
        eprintln!(
            "│ Next fracture: {:.0} money / {:.0} dark matter",
            req.primary, req.secondary
        );
        eprintln!("└────────────────────────────────────");
    }

    /// Play greedily for `total_seconds`. Returns the session at the end.
    fn simulate(total_seconds: u64) -> Session {
        let mut s = Session::with_defaults(EconomyConfig::default(), 2024).unwrap();
        let step = MAX_LIVE_DELTA_SECONDS as u64;
        let mut purchases = 0;
        let mut fracture_times = Vec::new();

        eprintln!("\n========================================");
        eprintln!("  Time Fracture balance simulator");
        eprintln!("  Play time: {}h", total_seconds / 3600);
        eprintln!("========================================\n");

        let mut elapsed = 0;
        while elapsed < total_seconds {
            s.advance(step as f64);
            elapsed += step;
            s.claim_all();

            if s.can_prestige() {
                let out = s.perform_prestige().unwrap();
                fracture_times.push(elapsed);
                eprintln!("  fracture → level {} at {}s (+{} shards)", out.new_level, elapsed, out.reward);
                assert_stats_consistent(&s);
            } else {
                purchases += spend(&mut s);
            }

            s.drain_events();
            if elapsed % 3600 == 0 {
                report(&s, elapsed, purchases);
                assert_stats_consistent(&s);
            }
        }

        eprintln!("\n======== Summary ========");
        report(&s, total_seconds, purchases);
        eprintln!("Fractures at: {fracture_times:?}");
        eprintln!("=========================\n");
        s
    }

    #[test]
    fn simulate_prestige_12h() {
        let s = simulate(12 * 3600);
        assert!(s.prestige().level() >= 1);
        assert!(s.prestige().state().lifetime_meta_earned >= 1.0);
    }
}
