use faer_core::Mat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use s_numdiff_rs::{group_columns, DiffError, GroupOrder, Groups, JacobianPattern, Structure};

fn random_pattern(rng: &mut StdRng, nrows: usize, ncols: usize, density: f64) -> JacobianPattern {
    let mut entries = Vec::new();
    for row in 0..nrows {
        for col in 0..ncols {
            if rng.gen_bool(density) {
                entries.push((row, col));
            }
        }
    }
    JacobianPattern::from_triplets(nrows, ncols, &entries).unwrap()
}

fn to_dense(pattern: &JacobianPattern) -> Mat<f64> {
    Mat::from_fn(pattern.nrows(), pattern.ncols(), |row, col| {
        if pattern.contains(row, col) {
            1.0
        } else {
            0.0
        }
    })
}

fn assert_valid(groups: &Groups, pattern: &JacobianPattern) {
    assert_eq!(groups.len(), pattern.ncols());
    assert!(groups.n_groups() <= pattern.ncols());
    for &id in groups.as_slice() {
        assert!(id < groups.n_groups());
    }
    if let Err(err) = groups.validate(pattern) {
        panic!("invalid grouping {:?}: {err}", groups.as_slice());
    }
}

fn banded(n: usize, half_width: usize) -> JacobianPattern {
    let mut entries = Vec::new();
    for row in 0..n {
        for col in row.saturating_sub(half_width)..(row + half_width + 1).min(n) {
            entries.push((row, col));
        }
    }
    JacobianPattern::from_triplets(n, n, &entries).unwrap()
}

#[test]
fn random_patterns_any_order() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let nrows = rng.gen_range(1..25);
        let ncols = rng.gen_range(1..25);
        let density = rng.gen_range(0.02..0.6);
        let pattern = random_pattern(&mut rng, nrows, ncols, density);
        let sparse = Structure::from(pattern.clone());
        let dense = Structure::from(to_dense(&pattern));

        for _ in 0..5 {
            let mut order: Vec<usize> = (0..ncols).collect();
            order.shuffle(&mut rng);
            let order = GroupOrder::Explicit(order);
            let from_sparse = group_columns(&sparse, &order).unwrap();
            let from_dense = group_columns(&dense, &order).unwrap();
            assert_valid(&from_sparse, &pattern);
            assert_eq!(from_sparse, from_dense);
        }

        assert_valid(&group_columns(&sparse, &GroupOrder::Random).unwrap(), &pattern);
    }
}

#[test]
fn explicit_order_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let pattern = random_pattern(&mut rng, 40, 30, 0.1);
    let structure = Structure::from(pattern);
    let mut order: Vec<usize> = (0..30).collect();
    order.shuffle(&mut rng);
    let order = GroupOrder::Explicit(order);
    let first = group_columns(&structure, &order).unwrap();
    let second = group_columns(&structure, &order).unwrap();
    assert_eq!(first, second);
}

#[test]
fn seeded_order_is_reproducible() {
    let structure = Structure::from(banded(50, 2));
    let first = group_columns(&structure, &GroupOrder::Seeded(9)).unwrap();
    let second = group_columns(&structure, &GroupOrder::Seeded(9)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn tridiagonal_in_natural_order() {
    let pattern = banded(10, 1);
    let groups = group_columns(
        &Structure::from(pattern.clone()),
        &GroupOrder::Explicit((0..10).collect()),
    )
    .unwrap();
    assert_eq!(groups.n_groups(), 3);
    let expected: Vec<usize> = (0..10).map(|col| col % 3).collect();
    assert_eq!(groups.as_slice(), expected.as_slice());
    assert_eq!(groups.members()[0], vec![0, 3, 6, 9]);
    assert_valid(&groups, &pattern);
}

#[test]
fn banded_needs_few_groups() {
    let pattern = banded(200, 2);
    let groups = group_columns(&Structure::from(pattern.clone()), &GroupOrder::Seeded(1)).unwrap();
    assert_valid(&groups, &pattern);
    assert!(groups.n_groups() >= 5);
    assert!(groups.n_groups() <= 9, "got {} groups", groups.n_groups());
}

#[test]
fn diagonal_and_full_extremes() {
    let diagonal = JacobianPattern::from_triplets(4, 4, &[(0, 0), (1, 1), (2, 2), (3, 3)]).unwrap();
    let groups = group_columns(&Structure::from(diagonal), &GroupOrder::Random).unwrap();
    assert_eq!(groups.n_groups(), 1);

    let full = Structure::from(Mat::from_fn(3, 4, |_, _| 2.5));
    let groups = group_columns(&full, &GroupOrder::Random).unwrap();
    assert_eq!(groups.n_groups(), 4);
    let mut ids = groups.as_slice().to_vec();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn no_columns() {
    let structure = Structure::from(JacobianPattern::from_triplets(3, 0, &[]).unwrap());
    let groups = group_columns(&structure, &GroupOrder::Random).unwrap();
    assert!(groups.is_empty());
    assert_eq!(groups.n_groups(), 0);
}

#[test]
fn bad_explicit_order() {
    let structure = Structure::from(banded(4, 1));
    let err = group_columns(&structure, &GroupOrder::Explicit(vec![0, 1, 1, 3])).unwrap_err();
    assert!(matches!(err, DiffError::InvalidOrder { .. }));
    let err = group_columns(&structure, &GroupOrder::Explicit(vec![0, 1, 2])).unwrap_err();
    assert!(matches!(err, DiffError::Shape { .. }));
}
