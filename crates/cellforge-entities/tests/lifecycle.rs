//! Integration tests for an entity working through a task queue with the
//! compliance monitor attached.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use cellforge_compliance::ComplianceMonitor;
use cellforge_entities::{
    ChromosomeGenerator, Entity, EntityConfig, ExchangePolicy, Execution, INSUFFICIENT_ENERGY,
    distribute,
};
use cellforge_types::{ComplianceStatus, Energy, EntityId, EntityStatus, Task};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn spawn(id: &str, energy: f64, rng: &mut SmallRng) -> Entity {
    let mut chromosome = ChromosomeGenerator::default().generate(rng);
    // Fixed cost of `base_cost` per task.
    chromosome.performance = 0.0;
    Entity::new(
        EntityId::from(id),
        EntityId::from("ROOT"),
        1,
        Energy::new(energy),
        chromosome,
    )
}

#[test]
fn entity_drains_to_rest_then_recovers_through_transfer() {
    let mut rng = SmallRng::seed_from_u64(11);
    let config = EntityConfig::default();
    let mut monitor = ComplianceMonitor::new();

    let mut worker = spawn("worker", 0.4, &mut rng);
    let mut donor = spawn("donor", 0.9, &mut rng);

    for i in 0..10 {
        worker.assign_task(Task::new(format!("job-{i}"))).unwrap();
    }

    while worker.status() == EntityStatus::Active {
        match worker.execute_next_task(&config, &mut monitor).unwrap() {
            Execution::Completed { .. } => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert!(worker.energy().value() <= config.energy_threshold);
    assert!(worker.completed_count() >= 1);

    let result = ExchangePolicy::default().transfer(&mut donor, &mut worker);
    assert!(result.is_transferred());
    assert!(worker.energy().value() > config.energy_threshold);

    // Receiving energy does not wake the entity on its own.
    assert_eq!(worker.status(), EntityStatus::Resting);
    worker.set_status(EntityStatus::Active);
    assert!(matches!(
        worker.execute_next_task(&config, &mut monitor).unwrap(),
        Execution::Completed { .. }
    ));

    assert!(monitor.verdict().compliant);
    assert_eq!(
        usize::try_from(worker.completed_count()).unwrap(),
        monitor.records_for(worker.id()).len()
    );
}

#[test]
fn starved_population_reports_pending_violations() {
    let mut rng = SmallRng::seed_from_u64(3);
    let config = EntityConfig::default();
    let mut monitor = ComplianceMonitor::new();
    let mut entities: Vec<Entity> = (0..3)
        .map(|i| spawn(&format!("e{i}"), 0.0, &mut rng))
        .collect();

    distribute(entities.iter_mut(), &[Task::from("heavy")]).unwrap();
    for entity in &mut entities {
        let outcome = entity.execute_next_task(&config, &mut monitor).unwrap();
        assert!(matches!(outcome, Execution::Refused { .. }));
    }

    let verdict = monitor.verdict();
    assert!(!verdict.compliant);
    assert_eq!(verdict.violations.len(), 3);
    for (i, violation) in verdict.violations.iter().enumerate() {
        assert_eq!(violation.entity_id, EntityId::from(format!("e{i}")));
        assert_eq!(violation.status, ComplianceStatus::Pending);
        assert_eq!(violation.error.as_deref(), Some(INSUFFICIENT_ENERGY));
    }
    assert!(entities.iter().all(|e| e.tasks().len() == 1));
}
