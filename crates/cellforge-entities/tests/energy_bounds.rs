//! Property tests: entity energy stays in `[0.0, 1.0]` across arbitrary
//! sequences of task assignment, execution, feeding, evolution, and
//! transfer.

#![allow(clippy::unwrap_used)]

use cellforge_compliance::ComplianceMonitor;
use cellforge_entities::{Entity, EntityConfig, ExchangePolicy};
use cellforge_types::{Chromosome, Energy, EntityId, EntityStatus, Task};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Assign,
    Execute,
    Feed(f64),
    Evolve,
    TransferFromPeer,
    TransferToPeer,
    Rest,
    Wake,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Assign),
        Just(Op::Execute),
        (-1.0f64..2.0f64).prop_map(Op::Feed),
        Just(Op::Evolve),
        Just(Op::TransferFromPeer),
        Just(Op::TransferToPeer),
        Just(Op::Rest),
        Just(Op::Wake),
    ]
}

prop_compose! {
    fn arb_chromosome()(
        performance in 0.0f64..=1.0f64,
        evolution_potential in 0.0f64..=1.0f64,
        learning in 0.0f64..=1.0f64,
        energy_efficiency in 0.0f64..=1.0f64,
        decision_speed in 0.0f64..=1.0f64,
    ) -> Chromosome {
        Chromosome {
            performance,
            evolution_potential,
            learning,
            energy_efficiency,
            decision_speed,
        }
    }
}

fn in_unit(energy: Energy) -> bool {
    (0.0..=1.0).contains(&energy.value())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn energy_stays_in_unit_interval(
        start in 0.0f64..=1.0f64,
        peer_start in 0.0f64..=1.0f64,
        chromosome in arb_chromosome(),
        ops in prop::collection::vec(arb_op(), 0..64),
    ) {
        let config = EntityConfig::default();
        let policy = ExchangePolicy::default();
        let mut monitor = ComplianceMonitor::new();
        let mut entity = Entity::new(
            EntityId::from("subject"),
            EntityId::from("ROOT"),
            1,
            Energy::new(start),
            chromosome,
        );
        let mut peer = Entity::new(
            EntityId::from("peer"),
            EntityId::from("ROOT"),
            1,
            Energy::new(peer_start),
            chromosome,
        );

        for op in ops {
            match op {
                Op::Assign => {
                    let _ = entity.assign_task(Task::from("work"));
                }
                Op::Execute => {
                    let _ = entity.execute_next_task(&config, &mut monitor);
                }
                Op::Feed(amount) => {
                    let _ = entity.receive_energy(amount);
                }
                Op::Evolve => {
                    entity.self_evolve(&config);
                }
                Op::TransferFromPeer => {
                    policy.transfer(&mut peer, &mut entity);
                }
                Op::TransferToPeer => {
                    policy.transfer(&mut entity, &mut peer);
                }
                Op::Rest => entity.set_status(EntityStatus::Resting),
                Op::Wake => entity.set_status(EntityStatus::Active),
            }
            prop_assert!(in_unit(entity.energy()), "energy {}", entity.energy());
            prop_assert!(in_unit(peer.energy()), "peer energy {}", peer.energy());
            prop_assert!(entity.chromosome().out_of_range_gene().is_none());
        }
    }

    #[test]
    fn completed_count_never_decreases(
        start in 0.0f64..=1.0f64,
        chromosome in arb_chromosome(),
        rounds in 1usize..32,
    ) {
        let config = EntityConfig::default();
        let mut monitor = ComplianceMonitor::new();
        let mut entity = Entity::new(
            EntityId::from("subject"),
            EntityId::from("ROOT"),
            1,
            Energy::new(start),
            chromosome,
        );

        let mut last = entity.completed_count();
        for _ in 0..rounds {
            entity.assign_task(Task::from("work")).unwrap();
            entity.execute_next_task(&config, &mut monitor).unwrap();
            prop_assert!(entity.completed_count() >= last);
            last = entity.completed_count();
        }
        prop_assert_eq!(monitor.len(), rounds);
    }

    #[test]
    fn transfer_conserves_energy(
        source in 0.0f64..=1.0f64,
        target in 0.0f64..=1.0f64,
    ) {
        let policy = ExchangePolicy::default();
        let chromosome = Chromosome::from_fn(|_| 0.5);
        let mut a = Entity::new(EntityId::from("a"), EntityId::from("ROOT"), 1, Energy::new(source), chromosome);
        let mut b = Entity::new(EntityId::from("b"), EntityId::from("ROOT"), 1, Energy::new(target), chromosome);

        let before = a.energy().value() + b.energy().value();
        policy.transfer(&mut a, &mut b);
        let after = a.energy().value() + b.energy().value();

        prop_assert!((before - after).abs() < 1e-9);
    }
}
