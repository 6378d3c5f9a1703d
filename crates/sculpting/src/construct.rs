//! Building a winged-edge mesh from indexed triangles.

use std::collections::{BTreeMap, HashMap};

use sculpt_mesh::{Edge, EdgeId, FaceIndex, MeshGeometry, MeshId, OctreeRoot, Triangle, VertexIndex};
use tracing::{debug, info};

use crate::action::{Action, ActionUnit};
use crate::error::SculptError;
use crate::history::History;
use crate::registry::MeshRegistry;

/// Register a new mesh built from `geometry` and record its creation.
///
/// The geometry must be an oriented 2-manifold, possibly with boundary.
/// Invalid input leaves registry and history unchanged.
pub fn build_mesh(
    registry: &mut MeshRegistry,
    history: &mut History,
    geometry: &MeshGeometry,
) -> Result<MeshId, SculptError> {
    validate_geometry(geometry)?;

    let id = registry.new_mesh();
    let margin = registry.octree_config().root_margin;
    let mesh = registry.expect_mut(id);
    let mut unit = ActionUnit::new();

    unit.init_octree_root(mesh, Some(OctreeRoot::enclosing(&geometry.bounds(), margin)));

    let vertices: Vec<VertexIndex> = geometry
        .positions
        .iter()
        .map(|&p| unit.add_vertex(mesh, p, 0))
        .collect();
    let faces: Vec<FaceIndex> = geometry
        .triangles
        .iter()
        .map(|t| unit.add_face(mesh, 0, t.map(|i| vertices[i as usize])))
        .collect();

    // One edge per undirected pair; the face that sees a->b first owns the
    // left side
    let mut records: Vec<Edge> = Vec::new();
    let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
    let mut face_loops: Vec<[usize; 3]> = Vec::with_capacity(faces.len());
    for (f, triangle) in geometry.triangles.iter().enumerate() {
        let mut edges = [0; 3];
        for k in 0..3 {
            let (a, b) = (triangle[k], triangle[(k + 1) % 3]);
            let slot = match directed.get(&(b, a)) {
                Some(&slot) => {
                    records[slot].right_face = Some(faces[f]);
                    slot
                }
                None => {
                    let id = unit.add_edge(mesh, 0);
                    let mut edge = mesh.expect_edge(id);
                    edge.vertex1 = Some(vertices[a as usize]);
                    edge.vertex2 = Some(vertices[b as usize]);
                    edge.left_face = Some(faces[f]);
                    records.push(edge);
                    records.len() - 1
                }
            };
            directed.insert((a, b), slot);
            edges[k] = slot;
        }
        face_loops.push(edges);
    }

    for (f, edges) in face_loops.iter().enumerate() {
        for k in 0..3 {
            let (prev, next) = (records[edges[(k + 2) % 3]].id, records[edges[(k + 1) % 3]].id);
            let record = &mut records[edges[k]];
            record.set_predecessor(faces[f], prev);
            record.set_successor(faces[f], next);
        }
    }

    let mut vertex_edges: BTreeMap<VertexIndex, EdgeId> = BTreeMap::new();
    for record in &records {
        let (v1, v2) = record.vertices();
        vertex_edges.entry(v1).or_insert(record.id);
        vertex_edges.entry(v2).or_insert(record.id);
        unit.modify_edge(mesh, record.id, |e| *e = *record);
    }
    for (vertex, edge) in vertex_edges {
        unit.modify_vertex(mesh, vertex, |v| v.edge = Some(edge));
    }
    for (f, edges) in face_loops.iter().enumerate() {
        let edge = records[edges[0]].id;
        unit.modify_face(mesh, faces[f], |face| face.edge = Some(edge));
    }

    mesh.sync_octree();
    if let Err(err) = mesh.validate() {
        debug!("Built mesh {:?} is inconsistent, discarding: {}", id, err);
        unit.undo(mesh);
        registry.remove(id);
        return Err(err.into());
    }

    info!(
        "Built mesh {:?}: {} vertices, {} faces, {} edges",
        id,
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.edge_count()
    );
    history.add_action(Action::NewMesh { mesh: id, unit });
    Ok(id)
}

/// Reject geometry that cannot form an oriented manifold mesh
pub fn validate_geometry(geometry: &MeshGeometry) -> Result<(), SculptError> {
    let invalid = |msg: String| Err(SculptError::InvalidGeometry(msg));
    let non_manifold = |msg: String| Err(SculptError::NonManifold(msg));

    if geometry.triangles.is_empty() {
        return invalid("no triangles".to_string());
    }
    if let Some(i) = geometry.positions.iter().position(|p| !p.is_finite()) {
        return invalid(format!("position {} is not finite", i));
    }

    let n = geometry.positions.len() as u32;
    let mut referenced = vec![false; n as usize];
    let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
    let mut undirected: HashMap<(u32, u32), usize> = HashMap::new();

    for (t, &[a, b, c]) in geometry.triangles.iter().enumerate() {
        if let Some(&i) = [a, b, c].iter().find(|&&i| i >= n) {
            return invalid(format!("triangle {} references vertex {} of {}", t, i, n));
        }
        if a == b || b == c || c == a {
            return invalid(format!("triangle {} repeats a vertex", t));
        }
        let triangle = Triangle::new(
            geometry.positions[a as usize],
            geometry.positions[b as usize],
            geometry.positions[c as usize],
        );
        if triangle.is_degenerate() {
            return invalid(format!("triangle {} has zero area", t));
        }

        for (u, v) in [(a, b), (b, c), (c, a)] {
            referenced[u as usize] = true;
            let count = undirected.entry((u.min(v), u.max(v))).or_default();
            *count += 1;
            if *count > 2 {
                return non_manifold(format!("edge ({}, {}) has more than two faces", u, v));
            }
            if let Some(other) = directed.insert((u, v), t) {
                return non_manifold(format!(
                    "triangles {} and {} traverse ({}, {}) in the same direction",
                    other, t, u, v
                ));
            }
        }
    }

    if let Some(i) = referenced.iter().position(|&r| !r) {
        return invalid(format!("vertex {} is not referenced", i));
    }

    // Around each vertex, the opposite edges of its triangles must chain into
    // a single fan: one path (boundary vertex) or one cycle (interior)
    let mut links: Vec<HashMap<u32, u32>> = vec![HashMap::new(); n as usize];
    for &[a, b, c] in &geometry.triangles {
        links[a as usize].insert(b, c);
        links[b as usize].insert(c, a);
        links[c as usize].insert(a, b);
    }
    for (vertex, link) in links.iter().enumerate() {
        let mut targets = link.values();
        let start = link
            .keys()
            .find(|k| !link.values().any(|v| v == *k))
            .or_else(|| targets.next())
            .copied();
        let Some(mut current) = start else { continue };

        let mut visited = 0;
        while let Some(&next) = link.get(&current) {
            visited += 1;
            current = next;
            if visited > link.len() || Some(current) == start {
                break;
            }
        }
        if visited != link.len() {
            return non_manifold(format!("vertex {} joins separate fans", vertex));
        }
    }
    Ok(())
}
