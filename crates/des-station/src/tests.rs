//! Unit tests for des-station.

use des_core::{
    Constant, Cycle, EntityId, EntityTypeId, ErrorKind, IdGenerator, QueueId, ResourceId,
    SimTime, StationId,
};
use des_entity::EntityStore;
use des_resource::SeizeRequirement;

use crate::{
    DelayOption, Generator, ProbabilisticSender, RequirementOption, RoundRobinSender, SendMode,
    Station, StationError, StationKind,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn s(n: u32) -> StationId {
    StationId(n)
}

/// A store with one entity of type "job".
fn one_job() -> (EntityStore, EntityId, EntityTypeId) {
    let mut store = EntityStore::new();
    let ty = store.add_type("job").unwrap();
    let e = store.create(ty, SimTime::ZERO).unwrap();
    (store, e, ty)
}

fn seize_station(id: u32) -> Station {
    Station::new(s(id), format!("seize{id}"), StationKind::Seize {
        queue:        QueueId(0),
        requirements: RequirementOption::default(),
    })
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use super::*;

    #[test]
    fn direct_and_by_type() {
        let (mut store, e, ty) = one_job();
        store.entity_type_mut(ty).unwrap().add_route(s(1), s(7));
        let (entity, ty) = store.with_type_mut(e).unwrap();

        assert_eq!(SendMode::Direct(s(3)).next_station(s(1), entity, ty).unwrap(), s(3));
        assert_eq!(SendMode::ByType.next_station(s(1), entity, ty).unwrap(), s(7));
        let err = SendMode::ByType.next_station(s(2), entity, ty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
    }

    #[test]
    fn by_sequence_walks_then_fails() {
        let (mut store, e, ty) = one_job();
        store.entity_type_mut(ty).unwrap().set_sequence(vec![s(4), s(5)]);
        let (entity, ty) = store.with_type_mut(e).unwrap();

        let mut mode = SendMode::BySequence;
        assert_eq!(mode.next_station(s(0), entity, ty).unwrap(), s(4));
        assert_eq!(mode.next_station(s(4), entity, ty).unwrap(), s(5));
        assert!(matches!(
            mode.next_station(s(5), entity, ty),
            Err(StationError::SequenceExhausted { .. })
        ));
    }

    #[test]
    fn probabilistic_sender_uses_cumulative_draws() {
        let (mut store, e, _) = one_job();
        let draws = Cycle::new(vec![0.1, 0.5, 0.29, 0.95]).unwrap();
        let sender = ProbabilisticSender::new(vec![(s(1), 0.3), (s(2), 0.7)], Box::new(draws)).unwrap();
        let mut mode = SendMode::BySender(Box::new(sender));
        let (entity, ty) = store.with_type_mut(e).unwrap();

        let picks: Vec<StationId> = (0..4).map(|_| mode.next_station(s(0), entity, ty).unwrap()).collect();
        assert_eq!(picks, vec![s(1), s(2), s(1), s(2)]);
    }

    #[test]
    fn probabilistic_sender_validates() {
        let bad_sum = ProbabilisticSender::new(vec![(s(1), 0.3), (s(2), 0.3)], Box::new(Constant(0.0)));
        assert!(matches!(bad_sum, Err(StationError::InvalidSender(_))));
        let negative = ProbabilisticSender::new(vec![(s(1), -0.5), (s(2), 1.5)], Box::new(Constant(0.0)));
        assert!(negative.is_err());
        assert!(ProbabilisticSender::new(vec![], Box::new(Constant(0.0))).is_err());
    }

    #[test]
    fn round_robin_cycles() {
        let (mut store, e, _) = one_job();
        let mut mode = SendMode::BySender(Box::new(RoundRobinSender::new(vec![s(1), s(2), s(3)]).unwrap()));
        let (entity, ty) = store.with_type_mut(e).unwrap();
        let picks: Vec<StationId> = (0..5).map(|_| mode.next_station(s(0), entity, ty).unwrap()).collect();
        assert_eq!(picks, vec![s(1), s(2), s(3), s(1), s(2)]);
        assert!(RoundRobinSender::new(vec![]).is_err());
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod options {
    use super::*;

    #[test]
    fn direct_list_comes_back_sorted() {
        let mut ids = IdGenerator::new();
        let (store, e, ty) = one_job();
        let late = SeizeRequirement::resource(ResourceId(0), 1).priority(3).build(&mut ids).unwrap();
        let early = SeizeRequirement::resource(ResourceId(1), 1).priority(0).build(&mut ids).unwrap();
        let opt = RequirementOption::Direct(vec![late.clone(), early.clone()]);

        let list = opt
            .resolve(s(0), store.get(e).unwrap(), store.entity_type(ty).unwrap())
            .unwrap();
        let order: Vec<_> = list.iter().map(|r| r.id()).collect();
        assert_eq!(order, vec![early.id(), late.id()]);
    }

    #[test]
    fn by_type_and_by_entity_lookups() {
        let mut ids = IdGenerator::new();
        let (mut store, e, ty) = one_job();
        let req = SeizeRequirement::resource(ResourceId(0), 2).build(&mut ids).unwrap();
        store.entity_type_mut(ty).unwrap().add_seize_requirement(s(0), req.clone());

        let entity = store.get(e).unwrap();
        let ty_ref = store.entity_type(ty).unwrap();
        let by_type = RequirementOption::<SeizeRequirement>::ByType;
        assert_eq!(by_type.resolve(s(0), entity, ty_ref).unwrap().len(), 1);

        let by_entity = RequirementOption::<SeizeRequirement>::ByEntity;
        let err = by_entity.resolve(s(0), entity, ty_ref).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
    }

    #[test]
    fn empty_direct_list_is_missing_configuration() {
        let (store, e, ty) = one_job();
        let opt = RequirementOption::<SeizeRequirement>::default();
        let err = opt
            .resolve(s(0), store.get(e).unwrap(), store.entity_type(ty).unwrap())
            .unwrap_err();
        assert!(matches!(err, StationError::NoRequirements { option: "direct", .. }));
    }

    #[test]
    fn delay_sources() {
        let (mut store, e, ty) = one_job();
        let ty_ref = store.entity_type_mut(ty).unwrap();

        let mut direct = DelayOption::Direct(Box::new(Constant(4.0)));
        assert_eq!(direct.sample(s(0), e, ty_ref).unwrap(), 4.0);

        let mut negative = DelayOption::Direct(Box::new(Constant(-1.0)));
        let err = negative.sample(s(0), e, ty_ref).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let mut by_type = DelayOption::ByType;
        let err = by_type.sample(s(0), e, ty_ref).unwrap_err();
        assert!(matches!(err, StationError::NoDelaySource { .. }));
        ty_ref.set_delay(s(0), Box::new(Constant(1.5)));
        assert_eq!(by_type.sample(s(0), e, ty_ref).unwrap(), 1.5);
    }
}

// ── Station ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod station {
    use super::*;

    #[test]
    fn composite_members_are_locked() {
        let mut member = seize_station(1);
        member.set_direct_receiver(s(9)).unwrap();
        member.wire_into_composite(s(5), s(2));
        assert_eq!(member.composite(), Some(s(5)));

        let err = member.set_send_mode(SendMode::ByType).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(matches!(member.send_mode(), Some(SendMode::Direct(to)) if *to == s(2)));
    }

    #[test]
    fn missing_send_mode() {
        let (mut store, e, _) = one_job();
        let mut st = seize_station(1);
        let (entity, ty) = store.with_type_mut(e).unwrap();
        assert!(matches!(st.next_station(s(1), entity, ty), Err(StationError::NoSendMode(_))));
    }

    #[test]
    fn requirements_only_on_matching_kind() {
        let mut ids = IdGenerator::new();
        let req = SeizeRequirement::resource(ResourceId(0), 1).build(&mut ids).unwrap();
        let mut st = seize_station(1);
        st.add_seize_requirement(req.clone()).unwrap();

        let mut dispose = Station::new(s(2), "out", StationKind::Dispose);
        assert!(matches!(
            dispose.add_seize_requirement(req.clone()),
            Err(StationError::WrongKind { expected: "seize", .. })
        ));

        let mut by_type = Station::new(s(3), "bt", StationKind::Seize {
            queue:        QueueId(0),
            requirements: RequirementOption::ByType,
        });
        assert!(matches!(by_type.add_seize_requirement(req), Err(StationError::NotDirect { .. })));
    }

    #[test]
    fn generator_refuses_entities_and_counts_down() {
        let gen_station = Station::new(
            s(0),
            "arrivals",
            StationKind::Generator(Generator::new(EntityTypeId(0), Box::new(Constant(2.0)))),
        );
        assert!(!gen_station.receives_entities());
        assert!(seize_station(1).receives_entities());

        let mut g = Generator::new(EntityTypeId(0), Box::new(Constant(2.0))).first_arrival(0.5).max_count(2);
        assert_eq!(g.first_delay(s(0)).unwrap(), 0.5);
        assert_eq!(g.next_delay(s(0)).unwrap(), 2.0);
        g.record_creation();
        assert!(!g.is_exhausted());
        g.record_creation();
        assert!(g.is_exhausted());
    }

    #[test]
    fn stats_track_arrivals_and_departures() {
        let mut st = seize_station(1);
        st.stats_mut().record_arrival();
        st.stats_mut().record_arrival();
        st.stats_mut().record_departure(3.0);
        assert_eq!(st.stats().received(), 2);
        assert_eq!(st.stats().sent(), 1);
        assert_eq!(st.stats().in_station().value(), 1.0);
        assert_eq!(st.stats().time_in_station().mean(), Some(3.0));
    }
}
