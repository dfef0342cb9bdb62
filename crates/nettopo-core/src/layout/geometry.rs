// ── Arrangement computation ──
//
// Groups are leveled over group edges and stacked top to bottom; each
// group is sized around its own leveled members. Ungrouped nodes get a
// lane to the right of every group.

use std::collections::HashMap;

use tracing::debug;

use super::leveling::{LevelGraph, bucket_levels};
use super::{Arrangement, GroupPlacement, LayoutConfig, NodePlacement, units};
use crate::model::{EntityId, Group, GroupGeometry, Node};
use crate::store::TopologyStore;

/// Members of one group, leveled and sized.
struct GroupBlock {
    /// Node indices, bucketed by level within the group.
    rows: Vec<Vec<usize>>,
    width: f64,
    height: f64,
}

impl GroupBlock {
    fn build(members: &[usize], edges: &[(usize, usize)], config: &LayoutConfig) -> Self {
        let mut graph = LevelGraph::new(members.len());
        for &(from, to) in edges {
            graph.add_edge(from, to);
        }
        let rows: Vec<Vec<usize>> = bucket_levels(&graph.assign_levels())
            .into_iter()
            .map(|row| row.into_iter().map(|local| members[local]).collect())
            .collect();

        let widest = rows
            .iter()
            .map(|row| config.row_width(row.len()))
            .fold(0.0, f64::max);
        let width = config
            .min_group_width
            .max(widest + 2.0 * config.group_padding);
        let content = if rows.is_empty() {
            config.group_header + config.group_padding
        } else {
            config.group_header + units(rows.len()) * config.row_pitch() - config.row_gap
                + config.group_padding
        };
        let height = config.min_group_height.max(content);

        Self {
            rows,
            width,
            height,
        }
    }
}

/// Compute a full arrangement of the current topology.
///
/// Pure: reads the store, never mutates it. Identical store contents
/// always produce an identical arrangement.
pub fn arrange(store: &TopologyStore, config: &LayoutConfig) -> Arrangement {
    let groups: Vec<&Group> = store.groups().collect();
    let nodes: Vec<&Node> = store.nodes().collect();

    let group_index: HashMap<&EntityId, usize> =
        groups.iter().enumerate().map(|(i, g)| (&g.id, i)).collect();
    let node_index: HashMap<&EntityId, usize> =
        nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();

    // A dangling group id counts as ungrouped.
    let node_group: Vec<Option<usize>> = nodes
        .iter()
        .map(|n| n.group_id.as_ref().and_then(|g| group_index.get(g).copied()))
        .collect();

    // Position of each node within its group's (or the lane's) member list.
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    let mut ungrouped: Vec<usize> = Vec::new();
    let mut local: Vec<usize> = vec![0; nodes.len()];
    for (i, g) in node_group.iter().enumerate() {
        let list = match g {
            Some(g) => &mut members[*g],
            None => &mut ungrouped,
        };
        local[i] = list.len();
        list.push(i);
    }

    // Group edges: explicit group connections plus node connections that
    // cross group boundaries. Intra-group and lane edges are kept apart.
    let mut group_graph = LevelGraph::new(groups.len());
    for gc in store.group_connections() {
        if let (Some(&a), Some(&b)) = (
            group_index.get(&gc.source_group_id),
            group_index.get(&gc.target_group_id),
        ) {
            group_graph.add_edge(a, b);
        }
    }
    let mut intra: Vec<Vec<(usize, usize)>> = vec![Vec::new(); groups.len()];
    let mut lane_edges: Vec<(usize, usize)> = Vec::new();
    for conn in store.connections() {
        let (Some(&s), Some(&t)) = (
            node_index.get(&conn.source_node_id),
            node_index.get(&conn.target_node_id),
        ) else {
            continue;
        };
        match (node_group[s], node_group[t]) {
            (Some(a), Some(b)) if a == b => intra[a].push((local[s], local[t])),
            (Some(a), Some(b)) => group_graph.add_edge(a, b),
            (None, None) => lane_edges.push((local[s], local[t])),
            _ => {}
        }
    }

    let blocks: Vec<GroupBlock> = members
        .iter()
        .zip(&intra)
        .map(|(m, e)| GroupBlock::build(m, e, config))
        .collect();

    let mut arrangement = Arrangement::default();
    let group_levels = group_graph.assign_levels();

    // Group rows, stacked; each row as tall as its tallest group.
    let mut y = config.origin_y;
    for bucket in bucket_levels(&group_levels) {
        let mut x = config.origin_x;
        let mut row_height: f64 = 0.0;
        for gi in bucket {
            let block = &blocks[gi];
            place_group_members(&mut arrangement, &nodes, groups[gi], block, x, y, config);
            arrangement.groups.insert(
                groups[gi].id.clone(),
                GroupPlacement {
                    geometry: GroupGeometry {
                        x,
                        y,
                        width: Some(block.width),
                        height: Some(block.height),
                    },
                    level: group_levels[gi],
                },
            );
            x += block.width + config.group_gap;
            row_height = row_height.max(block.height);
        }
        y += row_height + config.group_gap;
    }

    // Ungrouped lane.
    let lane_x = arrangement
        .groups_right_edge()
        .map_or(config.origin_x, |edge| edge + config.group_gap);
    let mut lane_graph = LevelGraph::new(ungrouped.len());
    for (from, to) in lane_edges {
        lane_graph.add_edge(from, to);
    }
    for (level, row) in bucket_levels(&lane_graph.assign_levels())
        .into_iter()
        .enumerate()
    {
        let row_y = config.origin_y + units(level) * config.row_pitch();
        for (col, local_idx) in row.into_iter().enumerate() {
            let node = nodes[ungrouped[local_idx]];
            arrangement.nodes.insert(
                node.id.clone(),
                NodePlacement {
                    x: lane_x + units(col) * config.column_pitch(),
                    y: row_y,
                    level,
                    group_id: None,
                },
            );
        }
    }

    debug!(
        groups = arrangement.groups.len(),
        nodes = arrangement.nodes.len(),
        "arrangement computed"
    );
    arrangement
}

fn place_group_members(
    arrangement: &mut Arrangement,
    nodes: &[&Node],
    group: &Group,
    block: &GroupBlock,
    gx: f64,
    gy: f64,
    config: &LayoutConfig,
) {
    for (level, row) in block.rows.iter().enumerate() {
        let row_x = gx + (block.width - config.row_width(row.len())) / 2.0;
        let row_y = gy + config.group_header + units(level) * config.row_pitch();
        for (col, &ni) in row.iter().enumerate() {
            arrangement.nodes.insert(
                nodes[ni].id.clone(),
                NodePlacement {
                    x: row_x + units(col) * config.column_pitch(),
                    y: row_y,
                    level,
                    group_id: Some(group.id.clone()),
                },
            );
        }
    }
}
