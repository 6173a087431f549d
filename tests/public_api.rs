use glam::DVec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use slur::{FH, Handle, HeStructure, KdTree, VH, primitive};

fn sq_dist(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[test]
fn t_face_vertex_round_trip() {
    let (topol, points) = primitive::quad_box(DVec3::ZERO, DVec3::ONE).unwrap();
    assert_eq!(points.len(), 8);
    let faces = topol.to_face_vertex();
    assert_eq!(faces.len(), 6);
    assert!(faces.iter().all(|f| f.len() == 4));
    let rebuilt = HeStructure::from_face_vertex(points.len(), &faces).unwrap();
    rebuilt.check_topology().unwrap();
    assert_eq!(rebuilt.num_vertices(), 8);
    assert_eq!(rebuilt.num_edges(), 12);
    assert_eq!(rebuilt.num_faces(), 6);
    assert_eq!(rebuilt.to_face_vertex(), faces);
}

#[test]
fn t_append_then_split() {
    let (mut topol, _) = primitive::tetrahedron(1.0).unwrap();
    let (other, _) = primitive::tetrahedron(2.0).unwrap();
    let offsets = topol.append(&other);
    assert_eq!(offsets.vertices, 4);
    assert_eq!(offsets.halfedges, 12);
    assert_eq!(offsets.faces, 4);
    topol.check_topology().unwrap();
    let comps = topol.split_disjoint().unwrap();
    assert_eq!(comps.len(), 2);
    for (i, comp) in comps.iter().enumerate() {
        comp.structure.check_topology().unwrap();
        assert_eq!(comp.structure.num_vertices(), 4);
        assert_eq!(comp.structure.num_edges(), 6);
        assert_eq!(comp.structure.num_faces(), 4);
        let first = 4 * i as u32;
        assert_eq!(
            comp.vertices,
            (first..first + 4).map(VH::from).collect::<Vec<_>>()
        );
        assert_eq!(comp.faces.first(), Some(&FH::from(first)));
        assert_eq!(comp.structure.to_face_vertex(), other.to_face_vertex());
    }
}

#[test]
fn t_compact_after_remove_face() {
    let (mut topol, points) = primitive::octahedron(1.0).unwrap();
    // The first two faces share the edge between vertices 0 and 4.
    topol.remove_face(FH::from(0)).unwrap();
    topol.remove_face(FH::from(1)).unwrap();
    topol.check_topology().unwrap();
    let mut ids: Vec<u32> = (0..topol.num_faces() as u32).collect();
    let maps = topol.compact();
    assert_eq!(maps.faces.num_removed(), 2);
    assert_eq!(maps.halfedges.num_removed(), 2);
    assert!(maps.vertices.is_identity());
    assert_eq!(maps.faces.get(FH::from(1)), None);
    assert_eq!(maps.faces.get(FH::from(2)), Some(FH::from(0)));
    maps.faces.apply(&mut ids).unwrap();
    assert_eq!(ids, (2..8).collect::<Vec<_>>());
    topol.check_topology().unwrap();
    assert_eq!(topol.num_faces(), 6);
    assert_eq!(topol.num_edges(), 11);
    assert_eq!(topol.num_vertices(), points.len());
    assert!(topol.faces().all(|f| f.index() < 6));
}

#[test]
fn t_kdtree_brute_force() {
    let mut rng = StdRng::seed_from_u64(11);
    let points: Vec<[f64; 3]> = (0..1000)
        .map(|_| {
            [
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
            ]
        })
        .collect();
    let tree = KdTree::create_balanced(3, 0.0, &points, (0..points.len()).collect::<Vec<usize>>()).unwrap();
    assert_eq!(tree.len(), 1000);
    for _ in 0..50 {
        let q = [
            rng.random_range(-6.0..6.0),
            rng.random_range(-6.0..6.0),
            rng.random_range(-6.0..6.0),
        ];
        let mut expected: Vec<f64> = points.iter().map(|p| sq_dist(p, &q)).collect();
        expected.sort_by(f64::total_cmp);
        let (_, d) = tree.nearest_l2(&q).unwrap().unwrap();
        assert!((d - expected[0]).abs() < 1e-12);
        let found = tree.k_nearest_l2(&q, 7).unwrap();
        assert_eq!(found.len(), 7);
        for ((i, d), e) in found.iter().zip(&expected) {
            assert!((d - e).abs() < 1e-12);
            assert!((sq_dist(&points[**i], &q) - e).abs() < 1e-12);
        }
        let mut count = 0;
        tree.range_search_l2(&q, 2.0, |_| {
            count += 1;
            true
        })
        .unwrap();
        assert_eq!(count, expected.iter().filter(|d| **d <= 4.0).count());
    }
}

#[test]
fn t_kdtree_sorted_insertion() {
    let mut tree = KdTree::new(2, 1e-9).unwrap();
    for i in 0..2000 {
        tree.insert(&[i as f64, i as f64], i).unwrap();
    }
    assert_eq!(tree.depth(), 2000);
    let (i, d) = tree.nearest_l1(&[1500.2, 1499.9]).unwrap().unwrap();
    assert_eq!(*i, 1500);
    assert!((d - 0.3).abs() < 1e-9);
    assert_eq!(tree.remove(&[0.0, 0.0]).unwrap(), Some(0));
    tree.balance();
    assert_eq!(tree.len(), 1999);
    assert!(tree.depth() <= 11);
    assert_eq!(tree.find(&[1999.0, 1999.0]).unwrap(), Some(&1999));
}
