//! # Dungeon Builder
//!
//! Turns a room node graph into placed rooms whose doorways line up.
//!
//! The builder picks a random node graph of the level, places the entrance,
//! then walks the graph depth first. Each child node tries the parent's free
//! doorways in random order, every template that can fill the node, and every
//! template doorway facing back at the parent. A room is accepted when its
//! translated bounds stay clear of all placed rooms and inside the optional
//! build boundary.
//!
//! All mutation during an attempt goes through an undo log, so backtracking
//! is a matter of rewinding to a checkpoint. A fresh working arena is built
//! for every graph attempt; nothing leaks from one attempt into the next.

use crate::{
    new_room_id, CellRect, DelveError, DelveResult, Doorway, DoorwayLink, Dungeon, DungeonLevel,
    GenerationConfig, Generator, Orientation, Position, Room, RoomNode, RoomNodeGraph,
    RoomNodeType, RoomTemplate, TileClassifier,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Counters describing how hard a build had to work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Node graphs tried
    pub graph_attempts: u32,
    /// Room placements tested across all attempts
    pub placement_attempts: u32,
    /// Placed rooms later removed because their subtree could not be built
    pub backtracks: u32,
}

/// A successful build with its statistics.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dungeon: Dungeon,
    pub stats: BuildStats,
}

/// Builds dungeons for one level.
///
/// Collaborators are injected at construction; the builder itself holds no
/// mutable state, so one instance can serve any number of builds.
pub struct DungeonBuilder<'a> {
    level: &'a DungeonLevel,
    classifier: &'a dyn TileClassifier,
}

/// A room placed in the working arena of one attempt.
#[derive(Debug, Clone)]
struct PlacedRoom<'a> {
    node_id: &'a str,
    template: &'a RoomTemplate,
    bounds: CellRect,
    doorways: Vec<Doorway>,
    parent: Option<usize>,
}

/// Arena indices of a connected doorway pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArenaLink {
    parent_room: usize,
    parent_doorway: usize,
    child_room: usize,
    child_doorway: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UndoEntry {
    RoomPlaced,
    DoorwaysConnected,
    DoorwayUnavailable { room: usize, doorway: usize },
}

/// A graph node waiting to be placed under an already placed room.
#[derive(Debug, Clone, Copy)]
struct PendingNode<'a> {
    parent_room: usize,
    node: &'a RoomNode,
}

/// Mutable state of a single graph attempt.
struct Workspace<'a> {
    rooms: Vec<PlacedRoom<'a>>,
    links: Vec<ArenaLink>,
    undo: Vec<UndoEntry>,
    placement_attempts: u32,
    backtracks: u32,
    max_placement_attempts: u32,
    overlap_margin: i32,
    build_bounds: Option<CellRect>,
}

impl<'a> Workspace<'a> {
    fn new(config: &GenerationConfig) -> Self {
        Self {
            rooms: Vec::new(),
            links: Vec::new(),
            undo: Vec::new(),
            placement_attempts: 0,
            backtracks: 0,
            max_placement_attempts: config.max_placement_attempts_per_graph,
            overlap_margin: config.overlap_margin,
            build_bounds: config.build_bounds,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.placement_attempts >= self.max_placement_attempts
    }

    fn checkpoint(&self) -> usize {
        self.undo.len()
    }

    /// Rewinds every mutation recorded after `checkpoint`.
    fn revert(&mut self, checkpoint: usize) {
        while self.undo.len() > checkpoint {
            match self.undo.pop() {
                Some(UndoEntry::RoomPlaced) => {
                    self.rooms.pop();
                }
                Some(UndoEntry::DoorwaysConnected) => {
                    if let Some(link) = self.links.pop() {
                        self.rooms[link.parent_room].doorways[link.parent_doorway].is_connected = false;
                        self.rooms[link.child_room].doorways[link.child_doorway].is_connected = false;
                    }
                }
                Some(UndoEntry::DoorwayUnavailable { room, doorway }) => {
                    self.rooms[room].doorways[doorway].is_unavailable = false;
                }
                None => break,
            }
        }
    }

    /// Whether `bounds` may be occupied by a new child of `parent`.
    ///
    /// The parent is tested without margin since the two rooms always share
    /// the doorway edge.
    fn fits(&self, bounds: &CellRect, parent: Option<usize>) -> bool {
        if let Some(limit) = self.build_bounds {
            if !limit.encloses(bounds) {
                return false;
            }
        }

        self.rooms.iter().enumerate().all(|(index, room)| {
            let margin = if Some(index) == parent { 0 } else { self.overlap_margin };
            !room.bounds.overlaps(bounds, margin)
        })
    }

    fn push_room(&mut self, node_id: &'a str, template: &'a RoomTemplate, bounds: CellRect, parent: Option<usize>) -> usize {
        let mut doorways = template.doorways.clone();
        doorways.iter_mut().for_each(Doorway::reset);
        self.rooms.push(PlacedRoom {
            node_id,
            template,
            bounds,
            doorways,
            parent,
        });
        self.undo.push(UndoEntry::RoomPlaced);
        self.rooms.len() - 1
    }

    /// Places the root room at its template coordinates.
    fn place_root(&mut self, node_id: &'a str, template: &'a RoomTemplate) -> Option<usize> {
        self.placement_attempts += 1;
        let bounds = template.bounds();
        if !self.fits(&bounds, None) {
            return None;
        }
        Some(self.push_room(node_id, template, bounds, None))
    }

    /// Tries to attach `template` to the parent's doorway through the
    /// template's doorway `child_doorway`.
    fn try_place(
        &mut self,
        node_id: &'a str,
        parent_room: usize,
        parent_doorway: usize,
        template: &'a RoomTemplate,
        child_doorway: usize,
    ) -> Option<usize> {
        self.placement_attempts += 1;

        let parent = &self.rooms[parent_room];
        let parent_door = &parent.doorways[parent_doorway];
        let child_door = &template.doorways[child_doorway];
        if !parent_door.is_compatible_with(child_door) {
            return None;
        }

        let lower = child_lower_bounds(parent, parent_door, template, child_door)?;
        let bounds = template.bounds().translated(lower - template.lower_bounds);
        if !self.fits(&bounds, Some(parent_room)) {
            return None;
        }

        let child_room = self.push_room(node_id, template, bounds, Some(parent_room));
        self.rooms[parent_room].doorways[parent_doorway].is_connected = true;
        self.rooms[child_room].doorways[child_doorway].is_connected = true;
        self.links.push(ArenaLink {
            parent_room,
            parent_doorway,
            child_room,
            child_doorway,
        });
        self.undo.push(UndoEntry::DoorwaysConnected);
        Some(child_room)
    }

    fn mark_unavailable(&mut self, room: usize, doorway: usize) {
        let door = &mut self.rooms[room].doorways[doorway];
        if !door.is_unavailable {
            door.is_unavailable = true;
            self.undo.push(UndoEntry::DoorwayUnavailable { room, doorway });
        }
    }
}

/// World-space lower corner of a child room joined through `child_door`.
///
/// The child doorway cell ends up one step outward from the parent doorway.
fn child_lower_bounds(
    parent: &PlacedRoom<'_>,
    parent_door: &Doorway,
    template: &RoomTemplate,
    child_door: &Doorway,
) -> Option<Position> {
    let adjustment = match child_door.orientation {
        Orientation::North => Position::new(0, -1),
        Orientation::East => Position::new(-1, 0),
        Orientation::South => Position::new(0, 1),
        Orientation::West => Position::new(1, 0),
        Orientation::None => return None,
    };

    Some(
        parent.bounds.lower + (parent_door.position - parent.template.lower_bounds) + adjustment
            + template.lower_bounds
            - child_door.position,
    )
}

impl<'a> DungeonBuilder<'a> {
    /// Creates a builder for `level`, baking obstacles with `classifier`.
    pub fn new(level: &'a DungeonLevel, classifier: &'a dyn TileClassifier) -> Self {
        Self { level, classifier }
    }

    pub fn level(&self) -> &DungeonLevel {
        self.level
    }

    /// Builds a dungeon and reports how much work it took.
    pub fn build<R: Rng + ?Sized>(&self, config: &GenerationConfig, rng: &mut R) -> DelveResult<BuildReport> {
        if self.level.room_node_graphs.is_empty() {
            return Err(DelveError::InvalidConfig(format!(
                "level '{}' has no room node graphs",
                self.level.name
            )));
        }

        let mut stats = BuildStats::default();

        while stats.graph_attempts < config.max_build_attempts {
            stats.graph_attempts += 1;

            let Some(graph) = self.level.room_node_graphs.choose(rng) else {
                break;
            };
            debug!(
                "Dungeon build attempt {} for level '{}' using graph '{}'",
                stats.graph_attempts, self.level.name, graph.name
            );

            let mut workspace = Workspace::new(config);
            let built = self.attempt_graph(graph, &mut workspace, rng);
            stats.placement_attempts += workspace.placement_attempts;
            stats.backtracks += workspace.backtracks;

            if built {
                let dungeon = self.finalize(graph, workspace, rng)?;
                info!(
                    "Built dungeon for level '{}' with {} rooms from graph '{}' after {} attempts",
                    self.level.name,
                    dungeon.len(),
                    graph.name,
                    stats.graph_attempts
                );
                return Ok(BuildReport { dungeon, stats });
            }

            debug!(
                "Graph '{}' failed after {} placement attempts",
                graph.name, workspace.placement_attempts
            );
        }

        warn!(
            "Dungeon build for level '{}' exhausted after {} attempts",
            self.level.name, stats.graph_attempts
        );
        Err(DelveError::BuildExhausted {
            level: self.level.name.clone(),
            attempts: stats.graph_attempts,
        })
    }

    /// Templates that can fill `node_type` when entered through a parent
    /// doorway facing `parent_orientation`.
    fn candidate_templates(&self, node_type: RoomNodeType, parent_orientation: Orientation) -> Vec<&'a RoomTemplate> {
        let wanted = match node_type {
            RoomNodeType::Corridor if parent_orientation.is_north_south() => RoomNodeType::CorridorNS,
            RoomNodeType::Corridor => RoomNodeType::CorridorEW,
            other => other,
        };

        self.level
            .room_templates
            .iter()
            .filter(|template| template.node_type == wanted)
            .collect()
    }

    fn attempt_graph<R: Rng + ?Sized>(
        &self,
        graph: &'a RoomNodeGraph,
        workspace: &mut Workspace<'a>,
        rng: &mut R,
    ) -> bool {
        let Some(entrance) = graph.entrance() else {
            warn!("Graph '{}' has no entrance node", graph.name);
            return false;
        };

        let mut templates = self.candidate_templates(RoomNodeType::Entrance, Orientation::None);
        templates.shuffle(rng);

        for template in templates {
            if workspace.is_exhausted() {
                break;
            }

            let checkpoint = workspace.checkpoint();
            let Some(room) = workspace.place_root(&entrance.id, template) else {
                continue;
            };

            let mut pending = Vec::new();
            push_children(graph, entrance, room, &mut pending);
            if self.place_pending(graph, workspace, &mut pending, rng) {
                return true;
            }
            workspace.revert(checkpoint);
        }

        false
    }

    /// Places every pending node, depth first, backtracking on failure.
    ///
    /// On failure `pending` and the workspace are left as they were on entry.
    fn place_pending<R: Rng + ?Sized>(
        &self,
        graph: &'a RoomNodeGraph,
        workspace: &mut Workspace<'a>,
        pending: &mut Vec<PendingNode<'a>>,
        rng: &mut R,
    ) -> bool {
        let Some(task) = pending.pop() else {
            return true;
        };

        let parent_room = task.parent_room;
        let mut doorways: Vec<usize> = workspace.rooms[parent_room]
            .doorways
            .iter()
            .enumerate()
            .filter(|(_, doorway)| doorway.is_free() && doorway.orientation != Orientation::None)
            .map(|(index, _)| index)
            .collect();
        doorways.shuffle(rng);

        'doorways: for parent_doorway in doorways {
            let parent_orientation = workspace.rooms[parent_room].doorways[parent_doorway].orientation;
            let mut templates = self.candidate_templates(task.node.node_type, parent_orientation);
            templates.shuffle(rng);
            let mut fitted = false;

            for template in templates {
                let mut child_doorways: Vec<usize> = template
                    .doorways
                    .iter()
                    .enumerate()
                    .filter(|(_, doorway)| doorway.orientation == parent_orientation.opposite())
                    .map(|(index, _)| index)
                    .collect();
                child_doorways.shuffle(rng);

                for child_doorway in child_doorways {
                    if workspace.is_exhausted() {
                        break 'doorways;
                    }

                    let checkpoint = workspace.checkpoint();
                    let pending_len = pending.len();
                    let Some(room) = workspace.try_place(
                        &task.node.id,
                        parent_room,
                        parent_doorway,
                        template,
                        child_doorway,
                    ) else {
                        continue;
                    };
                    fitted = true;

                    push_children(graph, task.node, room, pending);
                    if self.place_pending(graph, workspace, pending, rng) {
                        return true;
                    }

                    workspace.backtracks += 1;
                    workspace.revert(checkpoint);
                    pending.truncate(pending_len);
                }
            }

            if !fitted {
                workspace.mark_unavailable(parent_room, parent_doorway);
            }
        }

        pending.push(task);
        false
    }

    /// Converts a solved workspace into the runtime dungeon.
    fn finalize<R: Rng + ?Sized>(
        &self,
        graph: &RoomNodeGraph,
        workspace: Workspace<'a>,
        rng: &mut R,
    ) -> DelveResult<Dungeon> {
        let ids: Vec<_> = workspace.rooms.iter().map(|_| new_room_id(rng)).collect();

        let mut rooms: Vec<Room> = workspace
            .rooms
            .iter()
            .zip(&ids)
            .map(|(placed, &id)| {
                let mut room = Room::instantiate(
                    id,
                    placed.node_id,
                    placed.template,
                    placed.bounds.lower,
                    &self.level.name,
                );
                room.doorways = placed.doorways.clone();
                room.doorways
                    .iter_mut()
                    .for_each(|doorway| doorway.is_unavailable = false);
                room.parent_id = placed.parent.map(|parent| ids[parent]);
                room
            })
            .collect();

        for (index, placed) in workspace.rooms.iter().enumerate() {
            if let Some(parent) = placed.parent {
                rooms[parent].child_ids.push(ids[index]);
            }
        }

        for room in &mut rooms {
            let sealed = room.seal_unconnected_doorways();
            if sealed > 0 {
                debug!("Sealed {} unused doorways of room '{}'", sealed, room.node_id);
            }
            room.bake_obstacles(self.classifier);
        }

        let links = workspace
            .links
            .iter()
            .map(|link| DoorwayLink {
                parent: ids[link.parent_room],
                parent_doorway: link.parent_doorway,
                child: ids[link.child_room],
                child_doorway: link.child_doorway,
            })
            .collect();

        Dungeon::new(self.level.name.clone(), graph.name.clone(), rooms, links)
    }
}

fn push_children<'a>(
    graph: &'a RoomNodeGraph,
    node: &'a RoomNode,
    room: usize,
    pending: &mut Vec<PendingNode<'a>>,
) {
    let children: Vec<&RoomNode> = graph
        .children(node)
        .filter(|child| !child.node_type.is_none())
        .collect();

    // Reversed so the first authored child is placed first.
    for child in children.into_iter().rev() {
        pending.push(PendingNode {
            parent_room: room,
            node: child,
        });
    }
}

impl Generator<Dungeon> for DungeonBuilder<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<Dungeon> {
        let report = self.build(config, rng)?;
        self.validate(&report.dungeon, config)?;
        Ok(report.dungeon)
    }

    /// Checks doorway symmetry, non-overlap and the single entrance.
    fn validate(&self, dungeon: &Dungeon, config: &GenerationConfig) -> DelveResult<()> {
        let invalid = |reason: String| Err(DelveError::InvalidState(format!("invalid dungeon: {}", reason)));

        let entrances = dungeon
            .rooms()
            .filter(|room| room.node_type.is_entrance() && room.parent_id.is_none())
            .count();
        if entrances != 1 {
            return invalid(format!("{} parentless entrance rooms", entrances));
        }

        for link in dungeon.links() {
            let (Some(parent), Some(child)) = (dungeon.room(link.parent), dungeon.room(link.child)) else {
                return invalid("link refers to a missing room".to_string());
            };
            let (Some(parent_door), Some(child_door)) = (
                parent.doorways.get(link.parent_doorway),
                child.doorways.get(link.child_doorway),
            ) else {
                return invalid("link refers to a missing doorway".to_string());
            };

            if !parent_door.is_connected || !child_door.is_connected {
                return invalid(format!(
                    "doorway pair between '{}' and '{}' is only half connected",
                    parent.node_id, child.node_id
                ));
            }
            if parent_door.orientation.opposite() != child_door.orientation
                || parent_door.orientation == Orientation::None
            {
                return invalid(format!(
                    "doorways between '{}' and '{}' do not face each other",
                    parent.node_id, child.node_id
                ));
            }
            if parent.doorway_cell(parent_door) + parent_door.orientation.to_delta()
                != child.doorway_cell(child_door)
            {
                return invalid(format!(
                    "doorways between '{}' and '{}' are not adjacent",
                    parent.node_id, child.node_id
                ));
            }
        }

        let connected = dungeon
            .rooms()
            .flat_map(|room| room.doorways.iter())
            .filter(|doorway| doorway.is_connected)
            .count();
        if connected != dungeon.links().len() * 2 {
            return invalid(format!(
                "{} connected doorways for {} links",
                connected,
                dungeon.links().len()
            ));
        }

        let rooms: Vec<&Room> = dungeon.rooms().collect();
        for (index, a) in rooms.iter().enumerate() {
            if let Some(limit) = config.build_bounds {
                if !limit.encloses(&a.bounds()) {
                    return invalid(format!("room '{}' leaves the build boundary", a.node_id));
                }
            }
            for b in &rooms[index + 1..] {
                if a.bounds().overlaps(&b.bounds(), 0) {
                    return invalid(format!("rooms '{}' and '{}' overlap", a.node_id, b.node_id));
                }
            }
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonBuilder"
    }
}
