//! Platform reachability graph and breadth-first route search
//!
//! Nodes are platforms plus a virtual ground node under the searcher. An
//! edge exists to any other platform whose centre is within horizontal
//! reach and whose top is not more than the climb limit above the current
//! node. Nothing leads back to the ground; dropping down needs no plan.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Platform;

/// A place a fighter can stand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Node {
    /// The arena floor directly under the searcher
    Ground,
    /// Index into the round's platform list
    Platform(usize),
}

/// Traversal limits for a single jump/dash
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachLimits {
    /// Max horizontal distance between node centres
    pub reach: f32,
    /// Max upward height change
    pub max_climb: f32,
}

impl ReachLimits {
    /// True when a single traversal covers `from` to `to`
    #[inline]
    pub fn can_traverse(&self, from: Vec2, to: Vec2) -> bool {
        (to.x - from.x).abs() <= self.reach && from.y - to.y <= self.max_climb
    }
}

/// Standing point of a node: platform top centre, or the ground under `ground_x`
pub fn node_position(node: Node, platforms: &[Platform], ground_x: f32, ground_y: f32) -> Option<Vec2> {
    match node {
        Node::Ground => Some(Vec2::new(ground_x, ground_y)),
        Node::Platform(i) => platforms.get(i).map(|p| Vec2::new(p.center_x(), p.y)),
    }
}

/// Shortest hop sequence from `start` to platform `goal`, inclusive of both
/// ends. `ground_x` places the ground node when `start` is `Node::Ground`.
/// Returns `None` when the goal is unreachable or out of range.
pub fn find_path(
    platforms: &[Platform],
    start: Node,
    goal: usize,
    ground_x: f32,
    ground_y: f32,
    limits: ReachLimits,
) -> Option<Vec<Node>> {
    if goal >= platforms.len() {
        return None;
    }
    let goal = Node::Platform(goal);
    node_position(start, platforms, ground_x, ground_y)?;

    // Parent map doubles as the visited set
    let mut parents: HashMap<Node, Option<Node>> = HashMap::new();
    let mut queue = VecDeque::new();
    parents.insert(start, None);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return Some(reconstruct(&parents, goal));
        }
        let Some(from) = node_position(current, platforms, ground_x, ground_y) else {
            continue;
        };
        for (j, platform) in platforms.iter().enumerate() {
            let next = Node::Platform(j);
            if next == current || parents.contains_key(&next) {
                continue;
            }
            let to = Vec2::new(platform.center_x(), platform.y);
            if limits.can_traverse(from, to) {
                parents.insert(next, Some(current));
                queue.push_back(next);
            }
        }
    }
    None
}

fn reconstruct(parents: &HashMap<Node, Option<Node>>, goal: Node) -> Vec<Node> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&Some(parent)) = parents.get(&current) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// First node to head for: the hop after `start`, or the goal itself when
/// the path has nowhere further to go
pub fn next_step(path: &[Node], start: Node) -> Option<Node> {
    match path {
        [first, second, ..] if *first == start => Some(*second),
        [first, ..] => Some(*first),
        [] => None,
    }
}
