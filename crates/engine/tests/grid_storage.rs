//! BlockGrid storage, type cache, events and snapshot records.

use blockform_engine::grid::block::AbilityKind;
use blockform_engine::{
    BlockGrid, BlockLayer, BlockRecord, BlockType, BlockTypeRegistry, CacheKey, ChunkCoord,
    ChunkLayout, CollisionClass, Facing, GridError, GridEvent, Position,
};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> BlockTypeRegistry {
    let mut r = BlockTypeRegistry::new();
    r.register(BlockType::new("floor", BlockLayer::Base).with_mass(1.0)).unwrap();
    r.register(
        BlockType::new("wall", BlockLayer::Base)
            .with_collision(CollisionClass::Wall)
            .with_mass(2.0),
    )
    .unwrap();
    r.register(BlockType::new("console", BlockLayer::Top).with_ability(AbilityKind::Console))
        .unwrap();
    r.register(
        BlockType::new("shieldgen", BlockLayer::Top)
            .with_size(2, 2)
            .with_ability(AbilityKind::ShieldGenerator),
    )
    .unwrap();
    r.register(
        BlockType::new("laser", BlockLayer::Top)
            .with_ability(AbilityKind::Weapon)
            .blocks_front()
            .rotatable(),
    )
    .unwrap();
    r
}

fn put(grid: &mut BlockGrid, reg: &BlockTypeRegistry, id: &str, x: i32, y: i32) {
    let block = reg.block(id).unwrap();
    let layer = block.layer();
    grid.set(Position::new(x, y), layer, Some(block)).unwrap();
}

/// Records a short label for every event the grid fires.
fn record_events(grid: &mut BlockGrid) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    grid.subscribe(move |event| {
        let label = match event {
            GridEvent::ChunkCreated { layer, coord } => {
                format!("chunk {:?} {},{}", layer, coord.x, coord.y)
            }
            GridEvent::BlockAdded(b) => format!("added {} {}", b.type_id(), b.pos()),
            GridEvent::BlockRemoved(b) => format!("removed {} {}", b.type_id(), b.pos()),
            GridEvent::BlockChanged { new, old } => format!(
                "changed {} <- {}",
                new.as_ref().map_or("none", |b| b.type_id()),
                old.as_ref().map_or("none", |b| b.type_id())
            ),
        };
        sink.lock().unwrap().push(label);
    });
    log
}

// ---------------------------------------------------------------------------
// Cell access
// ---------------------------------------------------------------------------

#[test]
fn set_then_get_returns_the_block() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 3, -4);

    let block = grid.get(Position::new(3, -4), BlockLayer::Base).unwrap();
    assert_eq!(block.type_id(), "floor");
    assert_eq!(block.pos(), Position::new(3, -4));
    assert!(grid.get(Position::new(3, -4), BlockLayer::Top).is_none());
    assert_eq!(grid.len(BlockLayer::Base), 1);
}

#[test]
fn clearing_a_cell_empties_it_everywhere() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    for p in [Position::new(0, 0), Position::new(-40, 17), Position::new(9999, 9999)] {
        grid.set(p, BlockLayer::Base, None).unwrap();
        assert!(grid.get(p, BlockLayer::Base).is_none());
    }

    put(&mut grid, &reg, "floor", 1, 1);
    let old = grid.set(Position::new(1, 1), BlockLayer::Base, None).unwrap();
    assert_eq!(old.unwrap().type_id(), "floor");
    assert!(grid.get(Position::new(1, 1), BlockLayer::Base).is_none());
    assert!(grid.is_empty());
}

#[test]
fn replacing_returns_the_previous_occupant() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    let old = grid
        .set(Position::ZERO, BlockLayer::Base, Some(reg.block("wall").unwrap()))
        .unwrap();
    assert_eq!(old.unwrap().type_id(), "floor");
    assert_eq!(grid.len(BlockLayer::Base), 1);
    assert_eq!(grid.collision_class(Position::ZERO), Some(CollisionClass::Wall));
}

#[test]
fn writes_outside_the_chunk_array_are_rejected() {
    let reg = registry();
    let mut grid = BlockGrid::with_layout(ChunkLayout::new(4, 2, 2).unwrap());
    let far = Position::new(100, 0);
    let err = grid
        .set(far, BlockLayer::Base, Some(reg.block("floor").unwrap()))
        .unwrap_err();
    assert!(matches!(err, GridError::OutOfBounds(p) if p == far));
    assert!(grid.get(far, BlockLayer::Base).is_none());
    assert!(grid.is_empty());
}

#[test]
fn layer_mismatch_is_rejected() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    let err = grid
        .set(Position::ZERO, BlockLayer::Base, Some(reg.block("console").unwrap()))
        .unwrap_err();
    assert!(matches!(
        err,
        GridError::LayerMismatch { expected: BlockLayer::Base, found: BlockLayer::Top, .. }
    ));
}

#[test]
fn destroyed_blocks_cannot_be_stored() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    let dead = reg.block("floor").unwrap().with_health(0.0);
    let err = grid.set(Position::ZERO, BlockLayer::Base, Some(dead)).unwrap_err();
    assert!(matches!(err, GridError::DestroyedBlock(_)));
}

#[test]
fn unknown_type_is_a_registry_error() {
    let reg = registry();
    assert!(matches!(reg.block("warp-core"), Err(GridError::UnknownBlockType(id)) if id == "warp-core"));
}

#[test]
fn blocks_carry_the_owning_ship() {
    let reg = registry();
    let mut ships = slotmap::SlotMap::with_key();
    let ship: blockform_engine::ShipId = ships.insert(());
    let mut grid = BlockGrid::new().owned_by(ship);
    put(&mut grid, &reg, "floor", 0, 0);
    assert_eq!(grid.get(Position::ZERO, BlockLayer::Base).unwrap().ship(), Some(ship));
}

// ---------------------------------------------------------------------------
// Chunks
// ---------------------------------------------------------------------------

#[test]
fn chunks_are_allocated_on_first_write_only() {
    let reg = registry();
    let mut grid = BlockGrid::with_layout(ChunkLayout::new(4, 4, 4).unwrap());
    assert_eq!(grid.chunk_count(), 0);

    grid.set(Position::new(1, 1), BlockLayer::Base, None).unwrap();
    assert_eq!(grid.chunk_count(), 0);

    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "floor", 3, 3);
    assert_eq!(grid.chunk_count(), 1);
    put(&mut grid, &reg, "floor", -1, 0);
    assert_eq!(grid.chunk_count(), 2);

    // Origin sits at the first cell of the center chunk.
    let center = grid.chunk(BlockLayer::Base, ChunkCoord::new(2, 2)).unwrap();
    assert_eq!(center.len(), 2);
    assert!(grid.chunk(BlockLayer::Top, ChunkCoord::new(2, 2)).is_none());
    assert!(grid.chunk(BlockLayer::Base, ChunkCoord::new(9, 0)).is_none());

    // Emptied chunks stay allocated.
    grid.remove(Position::new(-1, 0), BlockLayer::Base);
    assert_eq!(grid.chunk_count(), 2);
}

// ---------------------------------------------------------------------------
// Neighbourhood
// ---------------------------------------------------------------------------

#[test]
fn edges_and_passability_follow_the_base_layer() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    for x in 0..3 {
        for y in 0..3 {
            put(&mut grid, &reg, "floor", x, y);
        }
    }
    put(&mut grid, &reg, "wall", 3, 1);

    assert!(!grid.is_edge(Position::new(1, 1)));
    assert!(grid.is_edge(Position::new(0, 0)));
    // Floor next to a wall is an edge even though nothing is empty there.
    grid.set(Position::new(1, 0), BlockLayer::Base, Some(reg.block("wall").unwrap()))
        .unwrap();
    assert!(grid.is_edge(Position::new(1, 1)));
    assert!(!grid.is_edge(Position::new(10, 10)));

    assert!(grid.is_passable(Position::new(1, 1)));
    assert!(grid.is_passable(Position::new(10, 10)));
    assert!(!grid.is_passable(Position::new(3, 1)));
}

#[test]
fn neighbors_are_cardinal_then_diagonal() {
    let n = BlockGrid::neighbors(Position::new(5, 5));
    assert_eq!(
        n,
        [Position::new(4, 5), Position::new(6, 5), Position::new(5, 4), Position::new(5, 6)]
    );
    let all = BlockGrid::neighbors_with_diagonal(Position::new(5, 5));
    assert_eq!(&all[..4], &n[..]);
    assert!(all.contains(&Position::new(6, 6)));
    assert!(all.contains(&Position::new(4, 4)));
}

#[test]
fn blocks_at_lists_base_then_top() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "console", 0, 0);

    let ids: Vec<&str> = grid.blocks_at(Position::ZERO).map(|b| b.type_id()).collect();
    assert_eq!(ids, ["floor", "console"]);
    assert_eq!(grid.topmost(Position::ZERO).unwrap().type_id(), "console");
    grid.remove(Position::ZERO, BlockLayer::Top);
    assert_eq!(grid.topmost(Position::ZERO).unwrap().type_id(), "floor");
}

// ---------------------------------------------------------------------------
// Type cache
// ---------------------------------------------------------------------------

#[test]
fn cache_tracks_types_and_abilities() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "floor", 1, 0);
    put(&mut grid, &reg, "shieldgen", 0, 0);

    assert_eq!(grid.find_by_type("floor").count(), 2);
    assert!(grid.has_type("shieldgen"));
    assert!(grid.has_ability(AbilityKind::ShieldGenerator));
    assert!(!grid.has_ability(AbilityKind::GravityGenerator));
    assert_eq!(grid.count_of(&CacheKey::Type("floor".into())), 2);

    // Every call starts a fresh iteration.
    assert_eq!(grid.find_by_type("floor").count(), 2);
}

#[test]
fn cache_never_yields_removed_blocks() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "floor", 1, 0);
    put(&mut grid, &reg, "shieldgen", 1, 0);

    grid.remove(Position::new(1, 0), BlockLayer::Base);
    grid.remove(Position::new(1, 0), BlockLayer::Top);

    let floors: Vec<Position> = grid.find_by_type("floor").map(|b| b.pos()).collect();
    assert_eq!(floors, [Position::ZERO]);
    assert!(!grid.has_ability(AbilityKind::ShieldGenerator));
    assert_eq!(grid.find_by_ability(AbilityKind::ShieldGenerator).count(), 0);
}

#[test]
fn replacement_moves_the_block_between_buckets() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "wall", 0, 0);
    assert!(!grid.has_type("floor"));
    assert_eq!(grid.find_by_type("wall").count(), 1);
}

#[test]
fn front_blockers_are_indexed() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    let laser = reg.block("laser").unwrap().with_facing(Facing::Right);
    grid.set(Position::ZERO, BlockLayer::Top, Some(laser)).unwrap();

    let blockers: Vec<_> = grid.front_blockers().collect();
    assert_eq!(blockers.len(), 1);
    assert_eq!(blockers[0].facing, Facing::Right);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[test]
fn events_fire_in_order_for_a_replacement() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    let log = record_events(&mut grid);

    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "wall", 0, 0);
    grid.remove(Position::ZERO, BlockLayer::Base);

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        [
            "chunk Base 8,8",
            "added floor (0, 0)",
            "changed floor <- none",
            "removed floor (0, 0)",
            "added wall (0, 0)",
            "changed wall <- floor",
            "removed wall (0, 0)",
            "changed none <- wall",
        ]
    );
}

#[test]
fn clearing_an_empty_cell_is_silent() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    let log = record_events(&mut grid);
    grid.remove(Position::new(1, 0), BlockLayer::Base);
    grid.remove(Position::new(500, 500), BlockLayer::Base);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn subscribers_see_the_cache_already_updated() {
    // A subscriber cannot see the grid, but the block it receives must
    // already be stored: check the count seen through a shared handle.
    let reg = registry();
    let mut grid = BlockGrid::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    grid.subscribe(move |event| {
        if let GridEvent::BlockAdded(b) = event {
            sink.lock().unwrap().push(b.pos());
        }
    });
    put(&mut grid, &reg, "floor", 2, 2);
    assert_eq!(*seen.lock().unwrap(), [Position::new(2, 2)]);
    assert!(grid.has_type("floor"));
}

#[test]
fn unsubscribed_callbacks_stop_receiving() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    let id = grid.subscribe(move |_| *sink.lock().unwrap() += 1);

    put(&mut grid, &reg, "floor", 0, 0);
    let after_first = *count.lock().unwrap();
    assert!(after_first > 0);

    assert!(grid.unsubscribe(id));
    assert!(!grid.unsubscribe(id));
    put(&mut grid, &reg, "floor", 1, 0);
    assert_eq!(*count.lock().unwrap(), after_first);
    assert_eq!(grid.subscriber_count(), 0);
}

#[test]
fn health_updates_are_clamped_and_announced() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    put(&mut grid, &reg, "floor", 0, 0);
    let log = record_events(&mut grid);

    assert_eq!(grid.set_health(Position::ZERO, BlockLayer::Base, 0.25), Some(0.25));
    assert_eq!(grid.set_health(Position::ZERO, BlockLayer::Base, -3.0), Some(0.0));
    assert_eq!(grid.set_health(Position::ZERO, BlockLayer::Base, 0.0), Some(0.0));
    assert_eq!(grid.set_health(Position::new(4, 4), BlockLayer::Base, 1.0), None);

    assert_eq!(log.lock().unwrap().len(), 2);
    let block = grid.get(Position::ZERO, BlockLayer::Base).unwrap();
    assert!(block.is_destroyed());
}

// ---------------------------------------------------------------------------
// Extents and mass
// ---------------------------------------------------------------------------

#[test]
fn extents_grow_and_never_shrink() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    assert!(grid.is_outside_bounds(Position::ZERO));

    put(&mut grid, &reg, "floor", -2, 1);
    put(&mut grid, &reg, "floor", 3, -1);
    let e = grid.extents();
    assert_eq!((e.min_x, e.min_y, e.max_x, e.max_y), (-2, -1, 3, 1));

    grid.remove(Position::new(3, -1), BlockLayer::Base);
    assert_eq!(grid.extents(), e);
    assert!(!grid.is_outside_bounds(Position::new(0, 0)));
    assert!(grid.is_outside_bounds(Position::new(4, 0)));
}

#[test]
fn mass_and_mirror_axis() {
    let reg = registry();
    let mut grid = BlockGrid::new();
    assert_eq!(grid.mirror_axis(), 0);
    assert!(grid.centroid().is_none());

    put(&mut grid, &reg, "floor", 0, 0);
    put(&mut grid, &reg, "wall", 4, 0);
    assert_eq!(grid.total_mass(), 3.0);
    assert_eq!(grid.centroid(), Some((2.0, 0.0)));
    assert_eq!(grid.mirror_axis(), 2);
}

// ---------------------------------------------------------------------------
// Snapshot records
// ---------------------------------------------------------------------------

fn sample_ship(reg: &BlockTypeRegistry) -> BlockGrid {
    let mut grid = BlockGrid::new();
    for x in -1..=2 {
        put(&mut grid, reg, "floor", x, 0);
    }
    put(&mut grid, reg, "wall", 3, 0);
    put(&mut grid, reg, "console", 0, 0);
    let laser = reg.block("laser").unwrap().with_facing(Facing::Left);
    grid.set(Position::new(-1, 0), BlockLayer::Top, Some(laser)).unwrap();
    grid.set_health(Position::new(1, 0), BlockLayer::Base, 0.5);
    grid
}

#[test]
fn records_describe_every_block() {
    let reg = registry();
    let grid = sample_ship(&reg);
    let records = grid.records();
    assert_eq!(records.len(), grid.total_len());

    let laser = records.iter().find(|r| r.type_id == "laser").unwrap();
    assert_eq!((laser.x, laser.y, laser.layer, laser.facing), (-1, 0, BlockLayer::Top, Facing::Left));
    let damaged = records.iter().find(|r| r.pos() == Position::new(1, 0)).unwrap();
    assert_eq!(damaged.health, 0.5);
}

#[test]
fn restore_is_independent_of_record_order() {
    let reg = registry();
    let original = sample_ship(&reg);
    let records = original.records();

    let mut forward = BlockGrid::new();
    forward.restore(&reg, &records).unwrap();

    let mut reversed = BlockGrid::new();
    reversed.restore(&reg, records.iter().rev()).unwrap();

    let mut interleaved: Vec<&BlockRecord> = records.iter().filter(|r| r.layer == BlockLayer::Top).collect();
    interleaved.extend(records.iter().filter(|r| r.layer == BlockLayer::Base));
    let mut shuffled = BlockGrid::new();
    shuffled.restore(&reg, interleaved).unwrap();

    assert_eq!(forward.records(), records);
    assert_eq!(reversed.records(), records);
    assert_eq!(shuffled.records(), records);
    assert_eq!(shuffled.find_by_type("floor").count(), 4);
}

#[test]
fn restore_stops_at_unknown_types() {
    let reg = registry();
    let records = vec![BlockRecord {
        type_id: "warp-core".into(),
        x: 0,
        y: 0,
        layer: BlockLayer::Base,
        facing: Facing::Up,
        health: 1.0,
    }];
    let mut grid = BlockGrid::new();
    assert!(matches!(grid.restore(&reg, &records), Err(GridError::UnknownBlockType(_))));
    assert!(grid.is_empty());
}
