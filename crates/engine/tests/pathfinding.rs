//! A* over ship grids.

use blockform_engine::{
    BlockGrid, BlockLayer, BlockType, BlockTypeRegistry, CollisionClass, GridConfig, Path,
    Pathfinder, Position,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> BlockTypeRegistry {
    let mut r = BlockTypeRegistry::new();
    r.register(BlockType::new("floor", BlockLayer::Base)).unwrap();
    r.register(BlockType::new("wall", BlockLayer::Base).with_collision(CollisionClass::Wall))
        .unwrap();
    r
}

/// A `size` x `size` floor with walls at `walls`.
fn deck(reg: &BlockTypeRegistry, size: i32, walls: &[(i32, i32)]) -> BlockGrid {
    let mut grid = BlockGrid::new();
    for x in 0..size {
        for y in 0..size {
            let id = if walls.contains(&(x, y)) { "wall" } else { "floor" };
            grid.set(Position::new(x, y), BlockLayer::Base, Some(reg.block(id).unwrap()))
                .unwrap();
        }
    }
    grid
}

fn assert_walkable(grid: &BlockGrid, path: &Path) {
    for pair in path.positions().windows(2) {
        assert_eq!(pair[0].manhattan(pair[1]), 1, "path jumps from {} to {}", pair[0], pair[1]);
    }
    for &pos in path.positions() {
        assert!(grid.is_passable(pos), "path crosses wall at {pos}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn open_deck_path_is_manhattan_optimal() {
    let reg = registry();
    let grid = deck(&reg, 5, &[]);
    let path = Pathfinder::default()
        .find_path(&grid, Position::new(0, 0), Position::new(4, 4))
        .unwrap();

    assert_eq!(path.steps(), 8);
    assert_eq!(path.len(), 9);
    assert_eq!(path.start(), Position::new(0, 0));
    assert_eq!(path.goal(), Position::new(4, 4));
    assert_walkable(&grid, &path);
}

#[test]
fn path_detours_around_walls() {
    let reg = registry();
    let walls = [(2, 0), (2, 1), (2, 2), (2, 3)];
    let grid = deck(&reg, 5, &walls);
    let config = GridConfig {
        path_padding: 0,
        ..GridConfig::default()
    };
    let path = Pathfinder::new(&config)
        .find_path(&grid, Position::new(0, 0), Position::new(4, 0))
        .unwrap();

    assert_eq!(path.steps(), 12);
    assert!(path.positions().contains(&Position::new(2, 4)));
    assert_walkable(&grid, &path);
}

#[test]
fn padding_lets_walks_leave_the_hull() {
    let reg = registry();
    let walls: Vec<(i32, i32)> = (0..5).map(|y| (2, y)).collect();
    let grid = deck(&reg, 5, &walls);
    let (start, goal) = (Position::new(0, 2), Position::new(4, 2));

    let around = Pathfinder::with_padding(2).find_path(&grid, start, goal).unwrap();
    assert_walkable(&grid, &around);
    assert!(around.positions().iter().any(|p| p.y < 0 || p.y > 4));

    assert!(Pathfinder::with_padding(0).find_path(&grid, start, goal).is_none());
}

#[test]
fn unreachable_goals_yield_no_path() {
    let reg = registry();
    let grid = deck(&reg, 5, &[(4, 4)]);
    let finder = Pathfinder::default();

    assert!(finder.find_path(&grid, Position::ZERO, Position::new(4, 4)).is_none());
    assert!(finder.find_path(&grid, Position::ZERO, Position::new(50, 0)).is_none());
}

#[test]
fn start_equal_to_goal_is_a_zero_step_path() {
    let reg = registry();
    let grid = deck(&reg, 3, &[]);
    let path = Pathfinder::default()
        .find_path(&grid, Position::new(1, 1), Position::new(1, 1))
        .unwrap();
    assert_eq!(path.positions(), [Position::new(1, 1)]);
    assert_eq!(path.steps(), 0);
}

#[test]
fn custom_passability_keeps_walks_on_deck() {
    let reg = registry();
    let grid = deck(&reg, 4, &[(1, 0), (1, 1), (1, 2)]);
    let on_floor = |p: Position| grid.get(p, BlockLayer::Base).is_some_and(|b| b.is("floor"));

    let path = Pathfinder::default()
        .find_path_with(&grid, Position::new(0, 0), Position::new(2, 0), on_floor)
        .unwrap();
    assert!(path.positions().iter().all(|&p| on_floor(p)));
    assert_eq!(path.steps(), 8);
}

#[test]
fn search_is_deterministic() {
    let reg = registry();
    let grid = deck(&reg, 6, &[(2, 2), (3, 3)]);
    let finder = Pathfinder::default();
    let first = finder.find_path(&grid, Position::ZERO, Position::new(5, 5)).unwrap();
    for _ in 0..5 {
        assert_eq!(finder.find_path(&grid, Position::ZERO, Position::new(5, 5)).unwrap(), first);
    }
}

#[test]
fn starts_at_the_edge_of_the_plane_find_nothing() {
    let reg = registry();
    let grid = deck(&reg, 3, &[]);
    let pathfinder = Pathfinder::default();

    for start in [
        Position::new(i32::MIN, 0),
        Position::new(i32::MAX, i32::MIN),
        Position::new(0, i32::MAX),
    ] {
        assert!(pathfinder.find_path(&grid, start, Position::new(1, 1)).is_none());
        assert!(pathfinder.find_path(&grid, Position::new(1, 1), start).is_none());
    }
}
