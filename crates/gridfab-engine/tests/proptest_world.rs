//! Property-based tests for chains and whole-world determinism.

use gridfab_core::material::MaterialStorage;
use gridfab_core::resource::Resource;
use gridfab_core::rotation::Rotation;
use gridfab_core::test_utils::{iron, steel, storage_with};
use gridfab_engine::test_utils::*;
use gridfab_engine::{Attribute, Entity, Terrain, World};
use gridfab_spatial::{Footprint, FreePosition, GridPosition};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

/// Things that can be dropped on a cell.
#[derive(Debug, Clone)]
enum Piece {
    Drill(Rotation),
    Belt(Rotation),
    Chest,
    Assembler,
    Wall,
}

fn arb_rotation() -> impl Strategy<Value = Rotation> {
    (0..4u8).prop_map(Rotation::from_index)
}

fn arb_piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        arb_rotation().prop_map(Piece::Drill),
        arb_rotation().prop_map(Piece::Belt),
        Just(Piece::Chest),
        Just(Piece::Assembler),
        Just(Piece::Wall),
    ]
}

fn arb_layout() -> impl Strategy<Value = Vec<(i32, i32, Piece)>> {
    proptest::collection::vec((0..8i32, 0..8i32, arb_piece()), 1..20)
}

fn build(seed: u64, layout: &[(i32, i32, Piece)], zombies: usize) -> World {
    let mut world = World::new(gridfab_engine::WorldConfig {
        seed,
        ..gridfab_engine::WorldConfig::sized(8, 8)
    });
    for x in 0..8 {
        world
            .set_terrain(GridPosition::new(x, x), Terrain::Deposit(Resource::Iron))
            .unwrap();
    }
    for (x, y, piece) in layout {
        let entity = match piece {
            Piece::Drill(r) => drill(*r),
            Piece::Belt(r) => belt(*r),
            Piece::Chest => chest(30),
            Piece::Assembler => assembler(),
            Piece::Wall => wall(20),
        };
        world.place(GridPosition::new(*x, *y), entity).unwrap();
    }
    for i in 0..zombies {
        world.spawn(FreePosition::from_f64(7.5, i as f64 + 0.5), zombie(5, 2));
    }
    world
}

fn total_iron(world: &World) -> u32 {
    world
        .live()
        .occupied()
        .iter()
        .filter_map(|(_, tile)| tile.tileable.attribute::<MaterialStorage>())
        .map(|s| s.quantity(Resource::Iron))
        .sum()
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A link that succeeded is not retried while a later link waits.
    #[test]
    fn earlier_links_run_once_per_cycle(wait in 0u32..30) {
        let mut world = small_world(1, 1);
        let crafter = Entity::building("crafter", Footprint::single(), Rotation::Up)
            .with_material(storage_with(100, &[iron(50)]))
            .with_chain(vec![
                Attribute::ConsumeMaterial(vec![iron(1)]),
                Attribute::reload(wait + 2),
                Attribute::ProduceMaterial(vec![steel(1)]),
            ]);
        let id = world.place(GridPosition::new(0, 0), crafter).unwrap();

        world.run(u64::from(wait));
        let storage = world.entity(id).unwrap().attribute::<MaterialStorage>().unwrap();
        prop_assert_eq!(storage.quantity(Resource::Iron), if wait == 0 { 50 } else { 49 });
        prop_assert_eq!(storage.quantity(Resource::Steel), 0);

        world.tick();
        let storage = world.entity(id).unwrap().attribute::<MaterialStorage>().unwrap();
        prop_assert_eq!(storage.quantity(Resource::Iron), 49);
        prop_assert_eq!(storage.quantity(Resource::Steel), 1);
    }

    /// Same seed, same placements: same state after every tick.
    #[test]
    fn worlds_are_deterministic(seed in any::<u64>(), layout in arb_layout(), zombies in 0usize..3) {
        let mut a = build(seed, &layout, zombies);
        let mut b = build(seed, &layout, zombies);
        for _ in 0..30 {
            a.tick();
            b.tick();
            prop_assert_eq!(a.state_hash(), b.state_hash());
        }
    }

    /// Storages never exceed their capacity, however items are routed.
    #[test]
    fn storages_respect_capacity(seed in any::<u64>(), layout in arb_layout()) {
        let mut world = build(seed, &layout, 0);
        for _ in 0..40 {
            world.tick();
            for (_, tile) in world.live().occupied() {
                if let Some(storage) = tile.tileable.attribute::<MaterialStorage>() {
                    prop_assert!(storage.total() <= storage.capacity());
                    prop_assert_eq!(storage.total() as usize, storage.entries().len());
                }
            }
        }
    }

    /// Transport moves items but never makes or loses them; only drills
    /// and assemblers change the amount of iron in the world.
    #[test]
    fn belts_conserve_items(seed in any::<u64>(), rotations in proptest::collection::vec(arb_rotation(), 1..12)) {
        let mut world = build(seed, &[], 0);
        let source = storage_with(20, &[iron(20)])
            .with_inputs(gridfab_core::rotation::RotationSet::EMPTY);
        let hopper = Entity::building("hopper", Footprint::single(), Rotation::Right)
            .with_material(source)
            .with_chain(vec![Attribute::TransportMaterial(
                gridfab_engine::transport::MaterialTransport::new(
                    gridfab_core::rotation::RotationSet::ALL,
                    1,
                ),
            )]);
        world.place(GridPosition::new(3, 4), hopper).unwrap();
        for (i, rotation) in rotations.iter().enumerate() {
            let x = (i % 8) as i32;
            let y = if i < 8 { 5 } else { 3 };
            world.place(GridPosition::new(x, y), belt(*rotation)).unwrap();
        }
        for _ in 0..30 {
            world.tick();
            prop_assert_eq!(total_iron(&world), 20);
        }
    }
}
