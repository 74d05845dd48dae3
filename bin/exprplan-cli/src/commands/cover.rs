// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `exprplan cover` command: show how a batch is cut into tiles and tasks.

use super::banner;
use tensor_meta::ShapeList;

/// Tasks listed in full before the table is cut short.
const MAX_LISTED_TASKS: usize = 16;

pub fn execute(shapes: &str, tile_size: usize, tiles_per_task: usize) -> anyhow::Result<()> {
    banner("Tile Cover");

    let shapes: ShapeList = shapes.parse()?;
    let cover = tile_planner::get_tiled_cover(&shapes, tile_size, tiles_per_task)?;
    cover.validate(&shapes)?;

    println!("  Shapes: {shapes} ({} elements)", shapes.num_elements());
    println!("  {}", cover.summary());
    println!();

    println!("  {:<6} {:<12} {}", "Task", "Tiles", "Sample:extent (size)");
    println!("  {}", "-".repeat(60));
    for (task, range) in cover.ranges.iter().enumerate().take(MAX_LISTED_TASKS) {
        let tiles: Vec<String> = cover.tiles[range.as_range()]
            .iter()
            .map(|t| format!("{}:{} ({})", t.sample_idx, t.extent_idx, t.size))
            .collect();
        println!(
            "  {:<6} {:<12} {}",
            task,
            format!("[{}, {})", range.begin, range.end),
            tiles.join(" "),
        );
    }
    if cover.num_tasks() > MAX_LISTED_TASKS {
        println!("  ... {} more tasks", cover.num_tasks() - MAX_LISTED_TASKS);
    }
    println!();
    Ok(())
}
