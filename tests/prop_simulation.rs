//! Property-based tests for whole-simulation invariants.
//!
//! Random grids, populations, profiles and feature phases are run and
//! checked for determinism, conservation and the capacity bound.

use proptest::prelude::*;

use barter_grid::core::config::{AgentProfile, FeatureFlags, RespawnConfig, ResourceSpec, SimConfig};
use barter_grid::core::types::Good;
use barter_grid::economy::utility::UtilitySpec;
use barter_grid::economy::Bundle;
use barter_grid::simulation::{build, SimulationEvent};

fn features_from(bits: u8) -> FeatureFlags {
    FeatureFlags {
        forage: bits & 1 != 0,
        trade_draft: bits & 2 != 0,
        trade_execution: bits & 4 != 0,
    }
}

fn arbitrary_config(
    width: i32,
    height: i32,
    agents: usize,
    resources: usize,
    seed: u64,
    respawn: bool,
) -> SimConfig {
    let initial_resources = (0..resources)
        .map(|i| {
            let i = i as i32;
            let kind = if i % 2 == 0 { Good::A } else { Good::B };
            ResourceSpec::typed((i * 7) % width, (i * 3) % height, kind)
        })
        .collect();
    SimConfig {
        grid_width: width,
        grid_height: height,
        initial_resources,
        agent_count: agents,
        perception_radius: 4,
        respawn: if respawn {
            RespawnConfig::default()
        } else {
            RespawnConfig::disabled()
        },
        seed,
        agent_profiles: vec![
            AgentProfile {
                utility: UtilitySpec::CobbDouglas { alpha: 0.7, beta: None },
                carrying: Bundle::from_pairs([(Good::B, 2)]),
                home: Bundle::from_pairs([(Good::A, 1)]),
            },
            AgentProfile {
                utility: UtilitySpec::PerfectComplements { alpha: 1.0, beta: 1.0 },
                carrying: Bundle::from_pairs([(Good::A, 3)]),
                home: Bundle::new(),
            },
            AgentProfile {
                utility: UtilitySpec::PerfectSubstitutes { alpha: 1.0, beta: 2.0 },
                carrying: Bundle::new(),
                home: Bundle::from_pairs([(Good::A, 2), (Good::B, 1)]),
            },
        ],
        features: FeatureFlags::all(),
        ..SimConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Two runs from the same inputs end in the same state
    #[test]
    fn prop_runs_are_deterministic(
        width in 3i32..12,
        height in 3i32..12,
        agents in 0usize..10,
        resources in 0usize..12,
        seed in any::<u64>(),
        phases in proptest::collection::vec(0u8..8, 1..4),
    ) {
        let config = arbitrary_config(width, height, agents, resources, seed, true);
        let run = || {
            let mut sim = build(config.clone(), None).unwrap();
            let mut log = Vec::new();
            for &bits in &phases {
                sim.set_features(features_from(bits));
                log.extend(sim.run(10).unwrap());
            }
            (sim.state_digest().unwrap(), sim.snapshot().resources, log.len())
        };
        prop_assert_eq!(run(), run());
    }

    /// Carried goods never exceed capacity, whatever the phase
    #[test]
    fn prop_capacity_bound(
        width in 3i32..10,
        height in 3i32..10,
        agents in 1usize..8,
        resources in 0usize..20,
        seed in any::<u64>(),
        bits in 0u8..8,
    ) {
        let config = arbitrary_config(width, height, agents, resources, seed, true);
        let capacity = config.carrying_capacity;
        let mut sim = build(config, None).unwrap();
        sim.set_features(features_from(bits));
        for _ in 0..30 {
            sim.step().unwrap();
            for agent in sim.agents() {
                prop_assert!(agent.carried() <= capacity);
            }
        }
    }

    /// Without respawn, goods only ever enter the system through collection
    #[test]
    fn prop_goods_enter_only_by_collection(
        width in 3i32..10,
        height in 3i32..10,
        agents in 1usize..8,
        resources in 0usize..15,
        seed in any::<u64>(),
    ) {
        let config = arbitrary_config(width, height, agents, resources, seed, false);
        let mut sim = build(config, None).unwrap();
        let mut expected = sim.total_goods();
        let mut on_grid = sim.grid().resource_count();
        for _ in 0..30 {
            for event in sim.step().unwrap() {
                if let SimulationEvent::ResourceCollected { kind, .. } = event {
                    expected.add(kind, 1);
                }
            }
            prop_assert_eq!(sim.total_goods(), expected.clone());
            prop_assert!(sim.grid().resource_count() <= on_grid);
            on_grid = sim.grid().resource_count();
        }
    }

    /// A trading-only phase reassigns goods but never changes totals
    #[test]
    fn prop_trade_only_conserves_totals(
        width in 2i32..8,
        height in 2i32..8,
        agents in 2usize..10,
        seed in any::<u64>(),
    ) {
        let mut config = arbitrary_config(width, height, agents, 6, seed, false);
        config.features = FeatureFlags::trade_only();
        let mut sim = build(config, None).unwrap();
        let before = sim.total_goods();
        let resources_before = sim.grid().resource_count();
        let events = sim.run(25).unwrap();
        prop_assert_eq!(sim.total_goods(), before);
        prop_assert_eq!(sim.grid().resource_count(), resources_before);
        for event in events {
            if let SimulationEvent::TradeExecuted {
                proposer_utility_before,
                proposer_utility_after,
                partner_utility_before,
                partner_utility_after,
                ..
            } = event
            {
                prop_assert!(proposer_utility_after >= proposer_utility_before);
                prop_assert!(partner_utility_after >= partner_utility_before);
            }
        }
    }
}
