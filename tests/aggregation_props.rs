use proptest::prelude::*;
use proptest::sample::select;
use shadergraph_ext::graph::capability::aggregate_space;
use shadergraph_ext::graph::node::ShaderNode;
use shadergraph_ext::graph::{
    CoordinateSpace, MaterialSlot, ModificationScope, SlotCollection, SlotType, SpaceRequirement,
    ShaderStageCapability,
};
use shadergraph_ext::nodes::pbr_master::{METALLIC_SLOT_ID, PbrSettings, declare_slots};
use shadergraph_ext::nodes::{Model, NormalDropOffSpace, PbrMasterNode};

fn stage() -> impl Strategy<Value = ShaderStageCapability> {
    prop_oneof![
        Just(ShaderStageCapability::Vertex),
        Just(ShaderStageCapability::Fragment),
        Just(ShaderStageCapability::All),
    ]
}

fn space() -> impl Strategy<Value = CoordinateSpace> {
    select(CoordinateSpace::ALL.to_vec())
}

fn requirement() -> impl Strategy<Value = SpaceRequirement> {
    select(SpaceRequirement::ALL.to_vec())
}

fn slot() -> impl Strategy<Value = MaterialSlot> {
    (0u32..64, 0u8..5, space(), stage(), any::<bool>()).prop_map(
        |(id, kind, space, stage, connected)| {
            let mut slot = match kind {
                0 => MaterialSlot::normal(id, "N", space, stage),
                1 => MaterialSlot::position(id, "P", space, stage),
                2 => MaterialSlot::tangent(id, "T", space, stage),
                3 => MaterialSlot::vector1(id, "V", SlotType::Input, 0.5, stage),
                _ => MaterialSlot::vector3(id, "O", SlotType::Output, [0.0; 3], stage),
            };
            slot.connected = connected;
            slot
        },
    )
}

fn settings() -> impl Strategy<Value = PbrSettings> {
    (
        any::<bool>(),
        select(vec![
            NormalDropOffSpace::Tangent,
            NormalDropOffSpace::Object,
            NormalDropOffSpace::World,
        ]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(specular, normal_drop_off_space, gsaa, anisotropy)| PbrSettings {
            model: if specular { Model::Specular } else { Model::Metallic },
            normal_drop_off_space,
            gsaa,
            anisotropy,
            ..PbrSettings::default()
        })
}

proptest! {
    #[test]
    fn aggregation_ignores_enumeration_order(
        (slots, shuffled) in prop::collection::vec(slot(), 0..16)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        kind in requirement(),
        stage in stage(),
    ) {
        let first = aggregate_space(&slots, kind, stage);
        prop_assert_eq!(first, aggregate_space(&slots, kind, stage));
        prop_assert_eq!(first, aggregate_space(&shuffled, kind, stage));
    }

    #[test]
    fn adding_a_slot_never_removes_spaces(
        slots in prop::collection::vec(slot(), 0..16),
        extra in slot(),
        kind in requirement(),
        stage in stage(),
    ) {
        let before = aggregate_space(&slots, kind, stage);
        let mut grown = slots.clone();
        grown.push(extra);
        prop_assert!(aggregate_space(&grown, kind, stage).contains(before));
    }

    #[test]
    fn all_stage_is_union_of_concrete_stages(
        slots in prop::collection::vec(slot(), 0..16),
        kind in requirement(),
    ) {
        let vertex = aggregate_space(&slots, kind, ShaderStageCapability::Vertex);
        let fragment = aggregate_space(&slots, kind, ShaderStageCapability::Fragment);
        prop_assert_eq!(
            aggregate_space(&slots, kind, ShaderStageCapability::All),
            vertex | fragment
        );
    }

    #[test]
    fn reconcile_is_idempotent(desired in prop::collection::vec(slot(), 0..16)) {
        let mut slots = SlotCollection::new();
        slots.reconcile(desired.clone());
        let snapshot = slots.clone();
        let diff = slots.reconcile(desired);
        prop_assert!(diff.is_topology_unchanged());
        prop_assert_eq!(slots.ids(), snapshot.ids());
        let mut ids = slots.ids();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), slots.len());
    }

    #[test]
    fn slot_set_tracks_settings(target in settings()) {
        let mut node = PbrMasterNode::new();
        let scopes = [
            node.set_model(target.model),
            node.set_normal_drop_off_space(target.normal_drop_off_space),
            node.set_gsaa(target.gsaa),
            node.set_anisotropy(target.anisotropy),
        ];
        prop_assert!(scopes.iter().all(|s| *s != ModificationScope::Graph));
        let expected: Vec<_> = declare_slots(&target).iter().map(|s| s.id).collect();
        prop_assert_eq!(node.slots().ids(), expected);
        prop_assert!(node.slots().contains(METALLIC_SLOT_ID));

        // Re-applying the same values is silent.
        prop_assert_eq!(node.set_model(target.model), ModificationScope::Nothing);
        prop_assert_eq!(node.set_gsaa(target.gsaa), ModificationScope::Nothing);
        prop_assert_eq!(node.set_anisotropy(target.anisotropy), ModificationScope::Nothing);
        prop_assert_eq!(
            node.set_normal_drop_off_space(target.normal_drop_off_space),
            ModificationScope::Nothing
        );
    }
}
